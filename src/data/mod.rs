//! Data layer: core types, loading, caching and the pure transforms.
//!
//! Architecture:
//! ```text
//!  characters.json + rankings.json | rankings.csv | rankings/<year>.json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse + validate → Vec<Character>, Vec<RankingEntry>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  store    │  read once per session, share as Arc<[T]>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ processor │  filters, ranges, stats, chart series
//!   └───────────┘
//! ```

pub mod error;
pub mod loader;
pub mod model;
pub mod processor;
pub mod search;
pub mod store;
