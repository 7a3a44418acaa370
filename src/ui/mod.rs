//! Rendering: side panel, top bar, detail window and the ranking chart.

pub mod panels;
pub mod plot;
