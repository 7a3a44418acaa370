//! Pure transforms over the roster and the ranking observations.
//!
//! Nothing here keeps state or mutates its inputs: the UI calls these on
//! every state change with the current collections and filter values.
//! Empty collections are a normal state (before the first load) and always
//! produce an empty result or a documented default, never a panic.

use std::collections::HashSet;

use chrono::Datelike;

use super::model::{
    Character, CharacterRankingStats, ChartDataPoint, RankRange, RankingChart, RankingEntry,
    RankingSeries, SeriesPoint, YearRange,
};
use super::search::multi_field_match;

/// First year of the default span returned for empty ranking data.
pub const DEFAULT_FIRST_YEAR: i32 = 1986;

/// Rank span returned for empty ranking data.
pub const DEFAULT_RANK_RANGE: RankRange = RankRange { min: 1, max: 12 };

/// Average rank assumed for characters without any ranking history when
/// ordering by popularity.
pub const UNRANKED_AVERAGE: f64 = 999.0;

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Character filter options. Only the search query has behaviour here;
/// rank filtering is [`characters_by_rank_range`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterFilter {
    pub search_query: Option<String>,
}

impl CharacterFilter {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search_query: Some(query.into()),
        }
    }
}

/// Case-insensitive substring match on `name` and `nameEn`.
/// An empty or absent query keeps every character in input order.
pub fn filter_characters<'a>(
    characters: &'a [Character],
    filter: &CharacterFilter,
) -> Vec<&'a Character> {
    let query = match filter.search_query.as_deref() {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return characters.iter().collect(),
    };
    characters
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&query)
                || c.name_en
                    .as_deref()
                    .is_some_and(|en| en.to_lowercase().contains(&query))
        })
        .collect()
}

/// Search box matching: like [`filter_characters`] but width-, kana- and
/// whitespace-insensitive, and also looks at the description.
pub fn search_characters<'a>(characters: &'a [Character], query: &str) -> Vec<&'a Character> {
    if query.trim().is_empty() {
        return characters.iter().collect();
    }
    characters
        .iter()
        .filter(|c| {
            multi_field_match(
                &[
                    Some(c.name.as_str()),
                    c.name_en.as_deref(),
                    Some(c.description.as_str()),
                ],
                query,
            )
        })
        .collect()
}

/// Entries whose year lies in `range` (inclusive), order preserved.
pub fn filter_rankings_by_year_range(
    rankings: &[RankingEntry],
    range: YearRange,
) -> Vec<RankingEntry> {
    rankings
        .iter()
        .filter(|e| range.contains(e.year))
        .cloned()
        .collect()
}

/// Characters with at least one entry ranked inside `range`, in input order.
pub fn characters_by_rank_range<'a>(
    characters: &'a [Character],
    rankings: &[RankingEntry],
    range: RankRange,
) -> Vec<&'a Character> {
    let qualifying: HashSet<&str> = rankings
        .iter()
        .filter(|e| range.contains(e.rank))
        .map(|e| e.character_id.as_str())
        .collect();
    characters
        .iter()
        .filter(|c| qualifying.contains(c.id.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Ranges and statistics
// ---------------------------------------------------------------------------

/// Span of years present in `rankings`.
///
/// Empty input yields `DEFAULT_FIRST_YEAR..=<current calendar year>` so
/// sliders always have bounds.
pub fn year_range(rankings: &[RankingEntry]) -> YearRange {
    let mut years = rankings.iter().map(|e| e.year);
    match years.next() {
        Some(first) => {
            let (min, max) = years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)));
            YearRange { min, max }
        }
        None => YearRange {
            min: DEFAULT_FIRST_YEAR,
            max: chrono::Local::now().year(),
        },
    }
}

/// Span of ranks present in `rankings`; [`DEFAULT_RANK_RANGE`] when empty.
pub fn rank_range(rankings: &[RankingEntry]) -> RankRange {
    let mut ranks = rankings.iter().map(|e| e.rank);
    match ranks.next() {
        Some(first) => {
            let (min, max) = ranks.fold((first, first), |(lo, hi), r| (lo.min(r), hi.max(r)));
            RankRange { min, max }
        }
        None => DEFAULT_RANK_RANGE,
    }
}

/// Best, worst and mean rank of one character plus its number of entries.
///
/// Every entry with a matching id counts, duplicates for the same year
/// included. A character without entries gets the all-zero sentinel.
pub fn character_ranking_stats(
    character_id: &str,
    rankings: &[RankingEntry],
) -> CharacterRankingStats {
    let mut stats = CharacterRankingStats::default();
    let mut sum: u64 = 0;
    for rank in rankings
        .iter()
        .filter(|e| e.character_id == character_id)
        .map(|e| e.rank)
    {
        if stats.appearances == 0 {
            stats.best_rank = rank;
            stats.worst_rank = rank;
        } else {
            stats.best_rank = stats.best_rank.min(rank);
            stats.worst_rank = stats.worst_rank.max(rank);
        }
        sum += u64::from(rank);
        stats.appearances += 1;
    }
    if stats.appearances > 0 {
        stats.average_rank = round_one_decimal(sum as f64 / stats.appearances as f64);
    }
    stats
}

/// Ranks are positive, so rounding half away from zero is rounding half up.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Order by average rank, best first. Characters without history go last;
/// ties keep their input order.
pub fn sort_characters_by_popularity<'a>(
    characters: &'a [Character],
    rankings: &[RankingEntry],
) -> Vec<&'a Character> {
    let mut keyed: Vec<(f64, &Character)> = characters
        .iter()
        .map(|c| {
            let stats = character_ranking_stats(&c.id, rankings);
            let average = if stats.is_ranked() {
                stats.average_rank
            } else {
                UNRANKED_AVERAGE
            };
            (average, c)
        })
        .collect();
    // `sort_by` is stable.
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, c)| c).collect()
}

// ---------------------------------------------------------------------------
// Chart shaping
// ---------------------------------------------------------------------------

/// One point per ranking entry of each requested character, oldest first.
/// Ids without a matching character are skipped.
pub fn create_chart_data_points(
    character_ids: &[String],
    characters: &[Character],
    rankings: &[RankingEntry],
) -> Vec<ChartDataPoint> {
    let mut points = Vec::new();
    for id in character_ids {
        let Some(character) = characters.iter().find(|c| &c.id == id) else {
            continue;
        };
        let mut entries: Vec<&RankingEntry> =
            rankings.iter().filter(|e| &e.character_id == id).collect();
        entries.sort_by_key(|e| e.year);
        points.extend(entries.into_iter().map(|e| ChartDataPoint {
            x: e.year,
            y: e.rank,
            character_id: e.character_id.clone(),
            character_name: character.name.clone(),
            color: character.color.clone(),
        }));
    }
    points
}

/// Largest accepted [`ChartPolicy::out_of_rank_offset`].
pub const MAX_OUT_OF_RANK_OFFSET: u32 = 1_000;
/// Largest rank accepted when loading ranking documents.
pub const MAX_RANK: u32 = 100_000;

/// How years without a ranking are placed on the chart.
///
/// Unranked years sit at `max_rank_in_data + out_of_rank_offset`, where
/// `max_rank_in_data` is the worst rank of the selected characters inside
/// the displayed years, raised to at least `min_visible_rank`, or
/// `fallback_max_rank` when the selection has no entries there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPolicy {
    pub out_of_rank_offset: u32,
    pub min_visible_rank: u32,
    pub fallback_max_rank: u32,
}

impl Default for ChartPolicy {
    fn default() -> Self {
        Self {
            out_of_rank_offset: 5,
            min_visible_rank: 10,
            fallback_max_rank: 50,
        }
    }
}

impl ChartPolicy {
    pub fn max_rank_in_data(
        &self,
        selected: &[String],
        rankings: &[RankingEntry],
        years: YearRange,
    ) -> u32 {
        rankings
            .iter()
            .filter(|e| years.contains(e.year) && selected.iter().any(|id| id == &e.character_id))
            .map(|e| e.rank)
            .max()
            .map_or(self.fallback_max_rank, |worst| worst.max(self.min_visible_rank))
    }
}

/// Build one series per selected character over every year of `years`.
///
/// * Years before the character's first ranking in the whole dataset get no
///   point at all.
/// * From that year on every year has a point: the real rank, or the
///   out-of-rank value when the year has no entry.
/// * If a year has several entries for the character, the first one in
///   `rankings` order is drawn.
///
/// Characters that are unknown, never ranked, or only ranked after the
/// displayed years produce no series.
pub fn build_ranking_chart(
    selected: &[String],
    characters: &[Character],
    rankings: &[RankingEntry],
    years: YearRange,
    policy: &ChartPolicy,
) -> RankingChart {
    let max_rank_in_data = policy.max_rank_in_data(selected, rankings, years);
    let out_of_rank_value = max_rank_in_data.saturating_add(policy.out_of_rank_offset);

    let series = selected
        .iter()
        .filter_map(|id| {
            let character = characters.iter().find(|c| &c.id == id)?;
            let own: Vec<&RankingEntry> =
                rankings.iter().filter(|e| &e.character_id == id).collect();
            let first_year = own.iter().map(|e| e.year).min()?;

            let points: Vec<SeriesPoint> = years
                .years()
                .filter(|&year| year >= first_year)
                .map(|year| match own.iter().find(|e| e.year == year) {
                    Some(e) => SeriesPoint {
                        year,
                        y: e.rank,
                        out_of_rank: false,
                    },
                    None => SeriesPoint {
                        year,
                        y: out_of_rank_value,
                        out_of_rank: true,
                    },
                })
                .collect();

            (!points.is_empty()).then(|| RankingSeries {
                character_id: character.id.clone(),
                name: character.name.clone(),
                color: character.color.clone(),
                points,
            })
        })
        .collect();

    RankingChart {
        years,
        series,
        max_rank_in_data,
        out_of_rank_value,
    }
}
