use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::processor::character_ranking_stats;
use crate::data::store::DataStore;
use crate::state::AppState;

/// Requests from the panels that the app, not the state, has to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    OpenDataDir(PathBuf),
    UseBundledData,
    Reload,
}

/// Small filled square in a character's colour.
fn color_swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color);
}

// ---------------------------------------------------------------------------
// Left side panel – character selector and filters
// ---------------------------------------------------------------------------

/// Render the left panel: search, selector list, year range, leaderboard.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, store: &DataStore) {
    if state.data.is_none() {
        ui.label("No data loaded.");
        return;
    }

    ui.heading("Characters");
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        let width = ui.available_width() - 28.0;
        ui.add(
            egui::TextEdit::singleline(&mut state.search_query)
                .hint_text("Search by name…")
                .desired_width(width),
        );
        if ui
            .add_enabled(!state.search_query.is_empty(), egui::Button::new("✖").small())
            .on_hover_text("Clear search")
            .clicked()
        {
            state.search_query.clear();
        }
    });

    ui.checkbox(&mut state.sort_by_popularity, "Sort by popularity");
    rank_filter_controls(ui, state);

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{} selected", state.selection.len()));
        if ui
            .add_enabled(!state.selection.is_empty(), egui::Button::new("Clear").small())
            .clicked()
        {
            state.clear_selection();
        }
    });
    ui.separator();

    // Snapshot the rows so the list can mutate state while iterating.
    let rows: Vec<(String, String, Color32)> = state
        .visible_characters()
        .iter()
        .map(|c| (c.id.clone(), c.display_label(), state.colors.color_for(&c.id)))
        .collect();

    ScrollArea::vertical()
        .id_salt("character_list")
        .max_height(ui.available_height() * 0.55)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            if rows.is_empty() {
                ui.weak("No characters match.");
            }
            for (id, label, color) in &rows {
                ui.horizontal(|ui: &mut Ui| {
                    color_swatch(ui, *color);
                    let mut checked = state.is_selected(id);
                    if ui.checkbox(&mut checked, label.as_str()).changed() {
                        state.toggle_character(id);
                    }
                    if ui.small_button("ℹ").on_hover_text("Details").clicked() {
                        state.detail_character = Some(id.clone());
                    }
                });
            }
        });

    ui.separator();
    year_range_controls(ui, state);

    ui.separator();
    leaderboard(ui, state, store);
}

fn rank_filter_controls(ui: &mut Ui, state: &mut AppState) {
    let available = state.available_ranks;
    let mut enabled = state.rank_filter.is_some();
    let mut range = state.rank_filter.unwrap_or(available);

    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut enabled, "Ranked")
            .on_hover_text("Only list characters that reached these ranks in the displayed years");
        ui.add_enabled_ui(enabled, |ui: &mut Ui| {
            ui.add(egui::DragValue::new(&mut range.min).range(available.min..=available.max));
            ui.label("to");
            ui.add(egui::DragValue::new(&mut range.max).range(available.min..=available.max));
        });
    });

    let wanted = enabled.then_some(range);
    if wanted != state.rank_filter {
        state.set_rank_filter(wanted);
    }
}

// ---------------------------------------------------------------------------
// Year range
// ---------------------------------------------------------------------------

fn year_range_controls(ui: &mut Ui, state: &mut AppState) {
    let available = state.available_years;

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Years");
        ui.label(state.year_range.to_string());
        if ui
            .add_enabled(!state.is_full_year_range(), egui::Button::new("Reset").small())
            .clicked()
        {
            state.reset_year_range();
        }
    });

    let mut start = state.year_range.min;
    if ui
        .add(egui::Slider::new(&mut start, available.min..=available.max).text("from"))
        .changed()
    {
        state.set_start_year(start);
    }

    let mut end = state.year_range.max;
    if ui
        .add(egui::Slider::new(&mut end, available.min..=available.max).text("to"))
        .changed()
    {
        state.set_end_year(end);
    }
}

// ---------------------------------------------------------------------------
// Leaderboard for one year
// ---------------------------------------------------------------------------

fn leaderboard(ui: &mut Ui, state: &mut AppState, store: &DataStore) {
    egui::CollapsingHeader::new(RichText::new("Leaderboard").strong())
        .id_salt("leaderboard")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let years = match store.available_years() {
                Ok(years) => years,
                Err(e) => {
                    ui.colored_label(Color32::RED, format!("{e:#}"));
                    return;
                }
            };
            let Some(latest) = years.last().copied() else {
                ui.weak("No rankings.");
                return;
            };
            let current = state.leaderboard_year.unwrap_or(latest);

            egui::ComboBox::from_id_salt("leaderboard_year")
                .selected_text(current.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for year in years.iter().rev() {
                        if ui.selectable_label(*year == current, year.to_string()).clicked() {
                            state.leaderboard_year = Some(*year);
                        }
                    }
                });

            let entries = match store.rankings_by_year(current) {
                Ok(entries) => entries,
                Err(e) => {
                    ui.colored_label(Color32::RED, format!("{e:#}"));
                    return;
                }
            };
            let Some(data) = state.data.clone() else {
                return;
            };
            for entry in entries {
                // Entries for unknown characters are skipped.
                let Some(character) = data.character(&entry.character_id) else {
                    continue;
                };
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(format!("#{:<3}", entry.rank));
                    color_swatch(ui, state.colors.color_for(&character.id));
                    if ui.link(&character.name).clicked() {
                        state.detail_character = Some(character.id.clone());
                    }
                    if let Some(votes) = entry.votes {
                        ui.weak(format!("{votes:.0} votes"));
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Character detail window
// ---------------------------------------------------------------------------

/// Floating window with one character's details and ranking history.
pub fn detail_window(ctx: &egui::Context, state: &mut AppState, store: &DataStore) {
    let Some(id) = state.detail_character.clone() else {
        return;
    };
    let character = match store.character_by_id(&id) {
        Ok(Some(character)) => character,
        Ok(None) => {
            log::warn!("No character with id '{id}'");
            state.detail_character = None;
            return;
        }
        Err(e) => {
            log::error!("Failed to look up character '{id}': {e:#}");
            state.detail_character = None;
            return;
        }
    };
    let Some(data) = state.data.clone() else {
        return;
    };

    let mut open = true;
    egui::Window::new(RichText::new(&character.name).strong())
        .id(egui::Id::new("character_detail"))
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(320.0)
        .show(ctx, |ui: &mut Ui| {
            if let Some(en) = &character.name_en {
                ui.weak(en);
            }
            if let Some(uri) = character
                .image_url
                .as_deref()
                .and_then(|url| store.source().resolve_image(url))
            {
                ui.vertical_centered(|ui: &mut Ui| {
                    ui.add(egui::Image::new(uri).max_height(120.0));
                });
            }
            if !character.description.is_empty() {
                ui.label(&character.description);
            }
            ui.separator();

            egui::Grid::new("character_detail_grid")
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    ui.strong("Debut");
                    ui.label(character.debut_year.to_string());
                    ui.end_row();

                    ui.strong("Colour");
                    ui.horizontal(|ui: &mut Ui| {
                        color_swatch(ui, state.colors.color_for(&character.id));
                        ui.monospace(&character.color);
                    });
                    ui.end_row();

                    let stats = character_ranking_stats(&character.id, &data.rankings);
                    if stats.is_ranked() {
                        ui.strong("Best");
                        ui.label(format!("#{}", stats.best_rank));
                        ui.end_row();
                        ui.strong("Worst");
                        ui.label(format!("#{}", stats.worst_rank));
                        ui.end_row();
                        ui.strong("Average");
                        ui.label(format!("#{:.1}", stats.average_rank));
                        ui.end_row();
                        ui.strong("Appearances");
                        ui.label(stats.appearances.to_string());
                        ui.end_row();
                    }
                });

            ui.separator();
            ui.strong("Recent rankings");
            match store.rankings_by_character(&character.id) {
                Ok(history) if history.is_empty() => {
                    ui.weak("Never ranked.");
                }
                Ok(history) => {
                    for entry in history.iter().rev().take(5) {
                        ui.label(format!("{}: #{}", entry.year, entry.rank));
                    }
                }
                Err(e) => {
                    ui.colored_label(Color32::RED, format!("{e:#}"));
                }
            }

            ui.separator();
            let selected = state.is_selected(&character.id);
            let label = if selected { "Remove from chart" } else { "Add to chart" };
            if ui.button(label).clicked() {
                state.toggle_character(&character.id);
            }
        });

    if !open {
        state.detail_character = None;
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar. The data entries are disabled while
/// `loading`.
pub fn top_bar(
    ui: &mut Ui,
    state: &AppState,
    store: &DataStore,
    loading: bool,
) -> Option<PanelAction> {
    let mut action = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            ui.add_enabled_ui(!loading, |ui: &mut Ui| {
                if ui.button("Open data folder…").clicked() {
                    action = pick_data_dir().map(PanelAction::OpenDataDir);
                    ui.close_menu();
                }
                if ui.button("Use bundled data").clicked() {
                    action = Some(PanelAction::UseBundledData);
                    ui.close_menu();
                }
                if ui.button("Reload").clicked() {
                    action = Some(PanelAction::Reload);
                    ui.close_menu();
                }
            });
        });

        ui.separator();

        if let Some(data) = &state.data {
            ui.label(format!(
                "{} characters, {} rankings from {}",
                data.characters.len(),
                data.rankings.len(),
                store.source().describe()
            ));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            egui::widgets::global_theme_preference_buttons(ui);
        });
    });

    action
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

fn pick_data_dir() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open ranking data folder")
        .pick_folder()
}

// ---------------------------------------------------------------------------
// Whole-window states
// ---------------------------------------------------------------------------

pub fn loading_state(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.horizontal_centered(|ui: &mut Ui| {
            ui.spinner();
            ui.label("Loading ranking data…");
        });
    });
}

/// Returns `true` when the user asks to retry.
pub fn error_state(ui: &mut Ui, message: &str) -> bool {
    let mut retry = false;
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() * 0.3);
        ui.heading(RichText::new("Could not load ranking data").color(Color32::RED));
        ui.add_space(8.0);
        ui.label(message);
        ui.add_space(12.0);
        retry = ui.button("Retry").clicked();
    });
    retry
}
