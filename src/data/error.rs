use std::path::PathBuf;

use thiserror::Error;

/// Why a collection could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {document}")]
    Json {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("parsing {document}")]
    Csv {
        document: String,
        #[source]
        source: csv::Error,
    },

    #[error(
        "no ranking data found in {} (expected rankings.json, rankings.csv or rankings/)",
        .0.display()
    )]
    MissingRankings(PathBuf),

    #[error("invalid data in {document}: {reason}")]
    Invalid { document: String, reason: String },
}

impl LoadError {
    pub(crate) fn invalid(document: &str, reason: impl Into<String>) -> Self {
        LoadError::Invalid {
            document: document.to_string(),
            reason: reason.into(),
        }
    }
}
