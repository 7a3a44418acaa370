use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use anyhow::Context as _;
use eframe::egui;

use crate::config::AppConfig;
use crate::data::loader::{DataSource, DirectorySource, EmbeddedSource};
use crate::data::model::{RankingData, YearRange};
use crate::data::store::DataStore;
use crate::state::{AppState, Preferences};
use crate::ui::panels::{self, PanelAction};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Load lifecycle
// ---------------------------------------------------------------------------

enum LoadStatus {
    Loading(Receiver<anyhow::Result<RankingData>>),
    Failed(String),
    Ready,
}

impl LoadStatus {
    fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading(_))
    }
}

/// Load both collections on a worker thread and wake the UI when done.
fn spawn_load(store: Arc<DataStore>, ctx: egui::Context) -> Receiver<anyhow::Result<RankingData>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = store
            .load_all()
            .with_context(|| format!("loading data from {}", store.source().describe()));
        // The receiver is gone only when the app was closed or reloaded.
        let _ = tx.send(result);
        ctx.request_repaint();
    });
    rx
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RankingViewerApp {
    pub state: AppState,
    store: Arc<DataStore>,
    status: LoadStatus,
    /// Year range restored from storage, applied once data arrives.
    saved_years: Option<YearRange>,
}

impl RankingViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let preferences: Preferences = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        log::debug!(
            "Restored {} selected characters, year range {:?}",
            preferences.selected_characters.len(),
            preferences.year_range
        );

        let store = Arc::new(DataStore::new(config.data_source()));
        let saved_years = preferences.year_range;
        let status = LoadStatus::Loading(spawn_load(Arc::clone(&store), cc.egui_ctx.clone()));

        Self {
            state: AppState::new(config.chart, preferences),
            store,
            status,
            saved_years,
        }
    }

    fn reload(&mut self, ctx: &egui::Context) {
        self.store.clear_cache();
        self.status = LoadStatus::Loading(spawn_load(Arc::clone(&self.store), ctx.clone()));
    }

    fn switch_source(&mut self, source: impl DataSource + 'static, ctx: &egui::Context) {
        log::info!("Switching data source to {}", source.describe());
        if self.state.data.is_some() {
            self.saved_years = Some(self.state.year_range);
        }
        self.store = Arc::new(DataStore::new(source));
        self.state.clear_data();
        self.reload(ctx);
    }

    fn handle(&mut self, action: PanelAction, ctx: &egui::Context) {
        // Clearing the cache would block on the slot the worker holds.
        if self.status.is_loading() {
            log::debug!("Ignoring {action:?} while a load is running");
            return;
        }
        match action {
            PanelAction::OpenDataDir(dir) => self.switch_source(DirectorySource::new(dir), ctx),
            PanelAction::UseBundledData => self.switch_source(EmbeddedSource, ctx),
            PanelAction::Reload => {
                if self.state.data.is_some() {
                    self.saved_years = Some(self.state.year_range);
                }
                self.reload(ctx);
            }
        }
    }

    /// Move a finished load into the state.
    fn poll_load(&mut self) {
        let LoadStatus::Loading(rx) = &self.status else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("loader thread exited unexpectedly")),
        };
        self.status = match outcome {
            Ok(data) => {
                self.state.set_data(data, self.saved_years);
                LoadStatus::Ready
            }
            Err(e) => {
                log::error!("Failed to load data: {e:#}");
                LoadStatus::Failed(format!("{e:#}"))
            }
        };
    }
}

impl eframe::App for RankingViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_load();

        // ---- Top panel: menu bar ----
        let action = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| panels::top_bar(ui, &self.state, &self.store, self.status.is_loading()))
            .inner;
        if let Some(action) = action {
            self.handle(action, ctx);
        }

        match &self.status {
            LoadStatus::Loading(_) => {
                egui::CentralPanel::default().show(ctx, panels::loading_state);
                return;
            }
            LoadStatus::Failed(message) => {
                let message = message.clone();
                let retry = egui::CentralPanel::default()
                    .show(ctx, |ui| panels::error_state(ui, &message))
                    .inner;
                if retry {
                    self.reload(ctx);
                }
                return;
            }
            LoadStatus::Ready => {}
        }

        // ---- Left side panel: selector + filters ----
        egui::SidePanel::left("selector_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, &self.store);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::ranking_plot(ui, &self.state);
        });

        panels::detail_window(ctx, &mut self.state, &self.store);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let mut preferences = self.state.preferences();
        if preferences.year_range.is_none() {
            preferences.year_range = self.saved_years;
        }
        eframe::set_value(storage, eframe::APP_KEY, &preferences);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_loading_status_reports_loading() {
        let (_tx, rx) = mpsc::channel();
        assert!(LoadStatus::Loading(rx).is_loading());
        assert!(!LoadStatus::Failed("boom".to_string()).is_loading());
        assert!(!LoadStatus::Ready.is_loading());
    }
}
