mod app;
mod config;
mod data;
mod state;
mod ui;

use app::SwitchDashboardApp;
use config::Config;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = Config::from_env();
    log::info!(
        "Starting dashboard with {} (top {})",
        config.data_path.display(),
        config.top_n
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Top Switch Games Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(SwitchDashboardApp::new(config)))),
    )
}
