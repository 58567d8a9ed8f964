mod annexure;
mod app;
mod config;
mod data;
mod filter;
mod state;
mod ui;

use app::AnnexureApp;
use config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::from_env().unwrap_or_else(|e| {
        log::error!("Ignoring settings: {e:#}");
        Settings::default()
    });
    log::info!("Annexures are written to {}", settings.output_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Annexure Creator",
        options,
        Box::new(|_cc| Ok(Box::new(AnnexureApp::new(settings)))),
    )
}
