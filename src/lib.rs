//! Character ranking history viewer.
//!
//! [`data`] holds everything that is independent of the UI: the model, the
//! loaders, the session cache and the pure transforms. The remaining modules
//! are the egui front end built on top of it.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
