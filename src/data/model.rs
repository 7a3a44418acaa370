use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Character – one entry of the roster
// ---------------------------------------------------------------------------

/// A single character of the roster.
///
/// Field names follow the camelCase keys of `characters.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Unique, stable key referenced by [`RankingEntry::character_id`].
    pub id: String,
    /// Localized display name.
    pub name: String,
    /// Optional secondary (English) display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default)]
    pub description: String,
    pub debut_year: i32,
    /// Representative colour as a hex string, e.g. `"#ff6fa5"`.
    pub color: String,
    /// Optional picture, relative to the data directory or an absolute URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Character {
    /// The label shown in lists: `name (nameEn)` when both are present.
    pub fn display_label(&self) -> String {
        match &self.name_en {
            Some(en) if !en.is_empty() && en != &self.name => format!("{} ({en})", self.name),
            _ => self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RankingEntry – one (character, year) observation
// ---------------------------------------------------------------------------

/// A character's rank in a given year. Smaller is better (1 = best).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub character_id: String,
    pub year: i32,
    pub rank: u32,
    /// Popularity metric, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<f64>,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }

    /// Every year of the range in ascending order. Empty when `min > max`.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.min..=self.max
    }

    /// Intersect with `bounds`, keeping `min <= max`.
    pub fn clamp_to(&self, bounds: YearRange) -> YearRange {
        let min = self.min.clamp(bounds.min, bounds.max);
        let max = self.max.clamp(min, bounds.max);
        YearRange { min, max }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.min, self.max)
    }
}

/// Inclusive range of ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankRange {
    pub min: u32,
    pub max: u32,
}

impl RankRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, rank: u32) -> bool {
        rank >= self.min && rank <= self.max
    }
}

/// Aggregate ranking statistics of one character.
///
/// All fields are zero when the character has no entries; check
/// [`CharacterRankingStats::is_ranked`] before trusting the others.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CharacterRankingStats {
    pub best_rank: u32,
    pub worst_rank: u32,
    /// Mean rank rounded to one decimal place.
    pub average_rank: f64,
    pub appearances: usize,
}

impl CharacterRankingStats {
    pub fn is_ranked(&self) -> bool {
        self.appearances > 0
    }
}

/// A flat chart point: one ranking entry enriched with display data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataPoint {
    /// Year.
    pub x: i32,
    /// Rank.
    pub y: u32,
    pub character_id: String,
    pub character_name: String,
    pub color: String,
}

// ---------------------------------------------------------------------------
// Chart series – one line of the ranking chart
// ---------------------------------------------------------------------------

/// A point of a [`RankingSeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    /// Real rank, or the out-of-rank sentinel when `out_of_rank` is set.
    pub y: u32,
    pub out_of_rank: bool,
}

/// All points of one character over the displayed years.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingSeries {
    pub character_id: String,
    pub name: String,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

/// Everything the ranking chart needs to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingChart {
    pub years: YearRange,
    pub series: Vec<RankingSeries>,
    /// Lowest rank labelled on the y axis.
    pub max_rank_in_data: u32,
    /// y value used for "unranked" years.
    pub out_of_rank_value: u32,
}

// ---------------------------------------------------------------------------
// RankingData – the two collections as one unit
// ---------------------------------------------------------------------------

/// Both loaded collections, shared cheaply with the UI.
#[derive(Debug, Clone)]
pub struct RankingData {
    pub characters: std::sync::Arc<[Character]>,
    pub rankings: std::sync::Arc<[RankingEntry]>,
}

impl RankingData {
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_parses_camel_case_json() {
        let json = r##"{
            "id": "hello-kitty",
            "name": "ハローキティ",
            "nameEn": "Hello Kitty",
            "description": "A cheerful white kitten.",
            "debutYear": 1974,
            "color": "#ff6fa5"
        }"##;
        let c: Character = serde_json::from_str(json).unwrap();
        assert_eq!(c.id, "hello-kitty");
        assert_eq!(c.name_en.as_deref(), Some("Hello Kitty"));
        assert_eq!(c.debut_year, 1974);
        assert!(c.image_url.is_none());
        assert_eq!(c.display_label(), "ハローキティ (Hello Kitty)");
    }

    #[test]
    fn ranking_entry_votes_are_optional() {
        let e: RankingEntry =
            serde_json::from_str(r#"{"characterId":"a","year":2001,"rank":3}"#).unwrap();
        assert_eq!(e.votes, None);
        assert_eq!(e.rank, 3);
    }

    #[test]
    fn year_range_clamp_keeps_order() {
        let bounds = YearRange::new(1990, 2020);
        assert_eq!(YearRange::new(1980, 2030).clamp_to(bounds), bounds);
        assert_eq!(
            YearRange::new(2025, 2030).clamp_to(bounds),
            YearRange::new(2020, 2020)
        );
        assert_eq!(YearRange::new(2000, 2010).years().count(), 11);
        assert_eq!(YearRange::new(2010, 2000).years().count(), 0);
    }
}
