use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::color::CharacterColors;
use crate::data::model::{
    Character, ChartDataPoint, RankRange, RankingChart, RankingData, YearRange,
};
use crate::data::processor::{
    build_ranking_chart, characters_by_rank_range, create_chart_data_points,
    filter_rankings_by_year_range, rank_range, search_characters, sort_characters_by_popularity,
    year_range, ChartPolicy,
};

// ---------------------------------------------------------------------------
// Persisted preferences
// ---------------------------------------------------------------------------

/// What survives a restart. Safe to discard at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub selected_characters: Vec<String>,
    pub year_range: Option<YearRange>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded collections (None until the first load finishes).
    pub data: Option<RankingData>,

    /// Colour of every character.
    pub colors: CharacterColors,

    /// Placement of unranked years on the chart.
    pub chart_policy: ChartPolicy,

    /// Selected character ids, in the order they were picked.
    pub selection: Vec<String>,

    /// Year span present in the data.
    pub available_years: YearRange,

    /// Displayed year span, always inside `available_years`.
    pub year_range: YearRange,

    /// Rank span present in the data.
    pub available_ranks: RankRange,

    /// Only list characters ranked inside this span (within `year_range`).
    pub rank_filter: Option<RankRange>,

    pub search_query: String,

    pub sort_by_popularity: bool,

    /// Character shown in the detail window.
    pub detail_character: Option<String>,

    /// Year shown in the leaderboard section.
    pub leaderboard_year: Option<i32>,

    /// Series for the current selection and years (cached).
    pub chart: Option<RankingChart>,

    /// Real observations of the selection inside the years (cached).
    pub markers: Vec<ChartDataPoint>,
}

impl AppState {
    pub fn new(chart_policy: ChartPolicy, preferences: Preferences) -> Self {
        let empty = year_range(&[]);
        Self {
            data: None,
            colors: CharacterColors::default(),
            chart_policy,
            selection: preferences.selected_characters,
            available_years: empty,
            year_range: preferences.year_range.unwrap_or(empty),
            available_ranks: rank_range(&[]),
            rank_filter: None,
            search_query: String::new(),
            sort_by_popularity: false,
            detail_character: None,
            leaderboard_year: None,
            chart: None,
            markers: Vec::new(),
        }
    }

    /// Ingest freshly loaded data. A saved year range is clamped to the
    /// years present; without one the full span is shown.
    pub fn set_data(&mut self, data: RankingData, saved_years: Option<YearRange>) {
        self.available_years = year_range(&data.rankings);
        self.available_ranks = rank_range(&data.rankings);
        self.year_range = match saved_years {
            Some(saved) => {
                let clamped = saved.clamp_to(self.available_years);
                if clamped != saved {
                    log::info!("Saved year range {saved} clamped to {clamped}");
                }
                clamped
            }
            None => self.available_years,
        };
        self.colors = CharacterColors::new(&data.characters);
        self.leaderboard_year = data.rankings.iter().map(|e| e.year).max();
        self.data = Some(data);
        self.refresh_chart();
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            selected_characters: self.selection.clone(),
            year_range: self.data.as_ref().map(|_| self.year_range),
        }
    }

    /// Rebuild the cached chart after selection or year changes.
    pub fn refresh_chart(&mut self) {
        let Some(data) = &self.data else {
            self.chart = None;
            self.markers.clear();
            return;
        };
        let chart = build_ranking_chart(
            &self.selection,
            &data.characters,
            &data.rankings,
            self.year_range,
            &self.chart_policy,
        );
        // Markers only where the line has a real rank; a duplicate entry for
        // the same year is not drawn.
        let on_line: HashSet<(&str, i32, u32)> = chart
            .series
            .iter()
            .flat_map(|s| {
                s.points
                    .iter()
                    .filter(|p| !p.out_of_rank)
                    .map(move |p| (s.character_id.as_str(), p.year, p.y))
            })
            .collect();
        let shown = filter_rankings_by_year_range(&data.rankings, self.year_range);
        let mut seen = HashSet::new();
        let markers = create_chart_data_points(&self.selection, &data.characters, &shown)
            .into_iter()
            .filter(|m| {
                on_line.contains(&(m.character_id.as_str(), m.x, m.y))
                    && seen.insert((m.character_id.clone(), m.x))
            })
            .collect();
        self.markers = markers;
        self.chart = Some(chart);
    }

    /// Forget the loaded data, e.g. before switching to another source.
    pub fn clear_data(&mut self) {
        self.data = None;
        self.detail_character = None;
        self.refresh_chart();
    }

    // ---- Selection ----

    pub fn is_selected(&self, character_id: &str) -> bool {
        self.selection.iter().any(|id| id == character_id)
    }

    pub fn toggle_character(&mut self, character_id: &str) {
        if self.is_selected(character_id) {
            self.remove_character(character_id);
        } else {
            self.add_character(character_id);
        }
    }

    pub fn add_character(&mut self, character_id: &str) {
        if !self.is_selected(character_id) {
            self.selection.push(character_id.to_string());
            self.refresh_chart();
        }
    }

    pub fn remove_character(&mut self, character_id: &str) {
        let before = self.selection.len();
        self.selection.retain(|id| id != character_id);
        if self.selection.len() != before {
            self.refresh_chart();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.refresh_chart();
    }

    // ---- Year range ----

    /// Move the first displayed year; pushes the last year along if needed.
    pub fn set_start_year(&mut self, year: i32) {
        let year = year.clamp(self.available_years.min, self.available_years.max);
        self.year_range.min = year;
        self.year_range.max = self.year_range.max.max(year);
        self.refresh_chart();
    }

    /// Move the last displayed year; pushes the first year along if needed.
    pub fn set_end_year(&mut self, year: i32) {
        let year = year.clamp(self.available_years.min, self.available_years.max);
        self.year_range.max = year;
        self.year_range.min = self.year_range.min.min(year);
        self.refresh_chart();
    }

    pub fn reset_year_range(&mut self) {
        self.year_range = self.available_years;
        self.refresh_chart();
    }

    pub fn is_full_year_range(&self) -> bool {
        self.year_range == self.available_years
    }

    // ---- Rank filter ----

    pub fn set_rank_filter(&mut self, range: Option<RankRange>) {
        self.rank_filter = range.map(|r| RankRange::new(r.min.min(r.max), r.min.max(r.max)));
    }

    // ---- Derived views ----

    /// Characters listed in the selector: search and rank filter applied,
    /// optionally ordered by popularity.
    pub fn visible_characters(&self) -> Vec<&Character> {
        let Some(data) = &self.data else {
            return Vec::new();
        };

        let ordered: Vec<&Character> = if self.sort_by_popularity {
            sort_characters_by_popularity(&data.characters, &data.rankings)
        } else {
            data.characters.iter().collect()
        };

        let matching: HashSet<&str> = search_characters(&data.characters, &self.search_query)
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();

        let in_rank: Option<HashSet<&str>> = self.rank_filter.map(|range| {
            let shown = filter_rankings_by_year_range(&data.rankings, self.year_range);
            characters_by_rank_range(&data.characters, &shown, range)
                .into_iter()
                .map(|c| c.id.as_str())
                .collect()
        });

        ordered
            .into_iter()
            .filter(|c| matching.contains(c.id.as_str()))
            .filter(|c| in_rank.as_ref().map_or(true, |ids| ids.contains(c.id.as_str())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::model::RankingEntry;

    fn character(id: &str, name_en: &str) -> Character {
        Character {
            id: id.to_string(),
            name: id.to_string(),
            name_en: Some(name_en.to_string()),
            description: String::new(),
            debut_year: 1980,
            color: "#336699".to_string(),
            image_url: None,
        }
    }

    fn entry(id: &str, year: i32, rank: u32) -> RankingEntry {
        RankingEntry {
            character_id: id.to_string(),
            year,
            rank,
            votes: None,
        }
    }

    fn data() -> RankingData {
        RankingData {
            characters: Arc::from(vec![
                character("kitty", "Hello Kitty"),
                character("melody", "My Melody"),
                character("kuromi", "Kuromi"),
            ]),
            rankings: Arc::from(vec![
                entry("kitty", 2000, 2),
                entry("melody", 2000, 1),
                entry("kuromi", 2005, 3),
                entry("kitty", 2010, 1),
                entry("melody", 2010, 20),
            ]),
        }
    }

    fn loaded(prefs: Preferences) -> AppState {
        let saved = prefs.year_range;
        let mut state = AppState::new(ChartPolicy::default(), prefs);
        state.set_data(data(), saved);
        state
    }

    #[test]
    fn saved_year_range_is_clamped_to_data() {
        let state = loaded(Preferences {
            selected_characters: vec!["kitty".into()],
            year_range: Some(YearRange::new(1990, 2005)),
        });
        assert_eq!(state.year_range, YearRange::new(2000, 2005));
        assert_eq!(state.chart.as_ref().unwrap().series.len(), 1);
    }

    #[test]
    fn missing_preferences_show_everything() {
        let state = loaded(Preferences::default());
        assert_eq!(state.year_range, YearRange::new(2000, 2010));
        assert!(state.is_full_year_range());
        assert_eq!(state.leaderboard_year, Some(2010));
    }

    #[test]
    fn selection_toggles_and_rebuilds_chart() {
        let mut state = loaded(Preferences::default());
        state.toggle_character("kuromi");
        state.toggle_character("kitty");
        assert_eq!(state.selection, vec!["kuromi", "kitty"]);
        assert_eq!(state.chart.as_ref().unwrap().series.len(), 2);
        let marker_years: Vec<(String, i32)> = state
            .markers
            .iter()
            .map(|m| (m.character_id.clone(), m.x))
            .collect();
        assert_eq!(
            marker_years,
            vec![
                ("kuromi".to_string(), 2005),
                ("kitty".to_string(), 2000),
                ("kitty".to_string(), 2010)
            ]
        );

        state.toggle_character("kuromi");
        assert!(!state.is_selected("kuromi"));
        state.add_character("kitty");
        assert_eq!(state.selection.len(), 1);

        state.clear_selection();
        assert!(state.chart.as_ref().unwrap().series.is_empty());
        assert_eq!(state.preferences().selected_characters, Vec::<String>::new());
    }

    #[test]
    fn markers_follow_the_line_for_duplicate_years() {
        let mut data = data();
        let mut rankings = data.rankings.to_vec();
        rankings.push(entry("kitty", 2000, 7));
        rankings.push(entry("kitty", 2010, 1));
        data.rankings = Arc::from(rankings);

        let mut state = AppState::new(ChartPolicy::default(), Preferences::default());
        state.set_data(data, None);
        state.toggle_character("kitty");

        let markers: Vec<(i32, u32)> = state.markers.iter().map(|m| (m.x, m.y)).collect();
        assert_eq!(markers, vec![(2000, 2), (2010, 1)]);
        let line: Vec<(i32, u32)> = state.chart.as_ref().unwrap().series[0]
            .points
            .iter()
            .filter(|p| !p.out_of_rank)
            .map(|p| (p.year, p.y))
            .collect();
        assert_eq!(markers, line);
    }

    #[test]
    fn year_bounds_never_cross() {
        let mut state = loaded(Preferences::default());
        state.set_end_year(2004);
        state.set_start_year(2008);
        assert_eq!(state.year_range, YearRange::new(2008, 2008));
        state.set_end_year(2001);
        assert_eq!(state.year_range, YearRange::new(2001, 2001));
        state.set_start_year(1900);
        assert_eq!(state.year_range.min, 2000);
        state.reset_year_range();
        assert!(state.is_full_year_range());
    }

    #[test]
    fn visible_characters_combine_search_rank_and_order() {
        let mut state = loaded(Preferences::default());
        let ids = |s: &AppState| -> Vec<String> {
            s.visible_characters().iter().map(|c| c.id.clone()).collect()
        };
        assert_eq!(ids(&state), vec!["kitty", "melody", "kuromi"]);

        state.sort_by_popularity = true;
        // kitty 1.5, kuromi 3.0, melody 10.5
        assert_eq!(ids(&state), vec!["kitty", "kuromi", "melody"]);

        state.set_rank_filter(Some(RankRange::new(2, 1)));
        assert_eq!(ids(&state), vec!["kitty", "melody"]);

        state.set_start_year(2010);
        assert_eq!(ids(&state), vec!["kitty"]);

        state.set_rank_filter(None);
        state.search_query = "ｍｅｌｏ".to_string();
        assert_eq!(ids(&state), vec!["melody"]);
    }

    #[test]
    fn preferences_round_trip_through_json() {
        let state = loaded(Preferences {
            selected_characters: vec!["melody".into()],
            year_range: None,
        });
        let json = serde_json::to_string(&state.preferences()).unwrap();
        let back: Preferences = serde_json::from_str(&json).unwrap();
        assert_eq!(back.year_range, Some(YearRange::new(2000, 2010)));
        assert_eq!(back.selected_characters, vec!["melody"]);
        let partial: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(partial, Preferences::default());
    }
}
