use eframe::egui::Ui;
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Ranking chart (central panel)
// ---------------------------------------------------------------------------

/// Ranks are drawn as negative y so that rank 1 sits at the top.
fn plot_y(rank: u32) -> f64 {
    -(rank as f64)
}

/// Axis marks are only labelled on whole numbers.
fn whole(value: f64) -> Option<i64> {
    let rounded = value.round();
    ((value - rounded).abs() < 1e-6).then_some(rounded as i64)
}

pub(crate) fn year_label(value: f64) -> String {
    whole(value).map(|y| y.to_string()).unwrap_or_default()
}

/// y axis label: `#n` for real ranks up to `max_rank`, "unranked" on the
/// out-of-rank line, nothing elsewhere.
pub(crate) fn rank_label(rank: f64, max_rank: u32, out_of_rank: u32) -> String {
    match whole(rank) {
        Some(r) if r >= 1 && r <= i64::from(max_rank) => format!("#{r}"),
        Some(r) if r == i64::from(out_of_rank) => "unranked".to_string(),
        _ => String::new(),
    }
}

/// Render the ranking chart in the central panel.
pub fn ranking_plot(ui: &mut Ui, state: &AppState) {
    let chart = match &state.chart {
        Some(chart) if !chart.series.is_empty() => chart,
        _ => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Select characters on the left to chart their ranking history");
            });
            return;
        }
    };

    let max_rank = chart.max_rank_in_data;
    let out_of_rank = chart.out_of_rank_value;

    Plot::new("ranking_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Rank")
        .include_x(chart.years.min as f64 - 0.5)
        .include_x(chart.years.max as f64 + 0.5)
        .include_y(plot_y(0) + 0.2)
        .include_y(plot_y(out_of_rank) - 0.5)
        .x_axis_formatter(|mark: GridMark, _range| year_label(mark.value))
        .y_axis_formatter(move |mark: GridMark, _range| {
            rank_label(-mark.value, max_rank, out_of_rank)
        })
        .label_formatter(move |name: &str, value: &PlotPoint| {
            if name.is_empty() {
                return String::new();
            }
            let year = value.x.round() as i64;
            let rank = (-value.y).round() as i64;
            if rank == i64::from(out_of_rank) {
                format!("{name}\n{year}: unranked")
            } else {
                format!("{name}\n{year}: #{rank}")
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let color = state.colors.color_for(&series.character_id);

                let line: PlotPoints = series
                    .points
                    .iter()
                    .map(|p| [p.year as f64, plot_y(p.y)])
                    .collect();
                plot_ui.line(Line::new(line).name(&series.name).color(color).width(2.5));

                // Markers only on real observations; unranked years are just the line.
                let ranked: PlotPoints = state
                    .markers
                    .iter()
                    .filter(|m| m.character_id == series.character_id)
                    .map(|m| [m.x as f64, plot_y(m.y)])
                    .collect();
                plot_ui.points(
                    Points::new(ranked)
                        .name(&series.name)
                        .color(color)
                        .radius(4.5),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_axis_labels_real_ranks_and_the_unranked_line() {
        assert_eq!(rank_label(1.0, 10, 15), "#1");
        assert_eq!(rank_label(10.0, 10, 15), "#10");
        assert_eq!(rank_label(12.0, 10, 15), "");
        assert_eq!(rank_label(15.0, 10, 15), "unranked");
        assert_eq!(rank_label(2.5, 10, 15), "");
        assert_eq!(rank_label(0.0, 10, 15), "");
    }

    #[test]
    fn year_axis_hides_fractional_marks() {
        assert_eq!(year_label(2005.0), "2005");
        assert_eq!(year_label(2005.5), "");
    }
}
