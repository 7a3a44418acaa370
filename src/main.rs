use eframe::egui;
use ranking_viewer::app::RankingViewerApp;
use ranking_viewer::config::AppConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_env();
    match &config.data_dir {
        Some(dir) => log::info!("Using ranking data from {}", dir.display()),
        None => log::info!("Using the bundled ranking data"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ranking Viewer",
        options,
        Box::new(move |cc| {
            // Image loaders for character pictures (file:// URIs).
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(RankingViewerApp::new(cc, config)))
        }),
    )
}
