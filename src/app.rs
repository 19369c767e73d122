use eframe::egui;

use crate::config::Config;
use crate::state::AppState;
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SwitchDashboardApp {
    pub state: AppState,
}

impl SwitchDashboardApp {
    /// Build the app and load the configured dataset.
    pub fn new(config: Config) -> Self {
        let mut state = AppState::new(config);
        let path = state.config.data_path.clone();
        state.open(&path);
        Self { state }
    }
}

impl eframe::App for SwitchDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, chart, tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard::dashboard(ui, &self.state);
        });
    }
}
