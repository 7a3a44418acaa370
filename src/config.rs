use std::path::PathBuf;

use crate::data::loader::{DataSource, DirectorySource, EmbeddedSource};
use crate::data::processor::{ChartPolicy, MAX_OUT_OF_RANK_OFFSET};

/// Directory with `characters.json` and the ranking documents.
pub const DATA_DIR_ENV: &str = "RANKING_VIEWER_DATA_DIR";
/// Override for [`ChartPolicy::out_of_rank_offset`].
pub const OUT_OF_RANK_OFFSET_ENV: &str = "RANKING_VIEWER_OUT_OF_RANK_OFFSET";

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// `None` means the bundled dataset.
    pub data_dir: Option<PathBuf>,
    pub chart: ChartPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let mut chart = ChartPolicy::default();
        if let Some(raw) = lookup(OUT_OF_RANK_OFFSET_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(offset) if (1..=MAX_OUT_OF_RANK_OFFSET).contains(&offset) => {
                    chart.out_of_rank_offset = offset
                }
                _ => log::warn!(
                    "Ignoring {OUT_OF_RANK_OFFSET_ENV}={raw:?}: expected an integer from 1 to {MAX_OUT_OF_RANK_OFFSET}"
                ),
            }
        }

        Self { data_dir, chart }
    }

    /// The data source this configuration points at.
    pub fn data_source(&self) -> Box<dyn DataSource> {
        match &self.data_dir {
            Some(dir) => Box::new(DirectorySource::new(dir.clone())),
            None => Box::new(EmbeddedSource),
        }
    }
}
