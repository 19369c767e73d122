use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::FilterColumn;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let options = state.options.clone();
    let before = (state.start_date, state.end_date, state.apply_date_range);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date pickers ----
            egui::Grid::new("date_range")
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Start date");
                    ui.add(DatePickerButton::new(&mut state.start_date).id_salt("start_date"));
                    ui.end_row();

                    ui.label("End date");
                    ui.add(DatePickerButton::new(&mut state.end_date).id_salt("end_date"));
                    ui.end_row();
                });
            ui.checkbox(&mut state.apply_date_range, "Apply date range")
                .on_hover_text("Keep only games released between the start and end date");
            ui.separator();

            // ---- Per-column multi-selects (collapsible) ----
            for column in FilterColumn::ALL {
                let Some(all_values) = options.get(&column) else {
                    continue;
                };

                // Show count of selected / total in the header
                let n_selected = state.filters.selected_count(column);
                let n_total = all_values.len();
                let header_text = format!("Select {}  ({n_selected}/{n_total})", column.label());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(column.name())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui
                            .add_enabled(n_selected > 0, egui::Button::new("Clear").small())
                            .clicked()
                        {
                            state.clear_filter(column);
                        }

                        for val in all_values {
                            let mut checked = state.filters.is_selected(column, val);
                            if ui.checkbox(&mut checked, val.as_str()).changed() {
                                state.toggle_filter_value(column, val);
                            }
                        }
                    });
            }
        });

    if before != (state.start_date, state.end_date, state.apply_date_range) {
        state.refilter();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.summary.is_some(), egui::Button::new("Export summary…"))
                .clicked()
            {
                export_summary_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(view)) = (&state.dataset, &state.view) {
            ui.label(format!("{} games loaded, {} visible", ds.len(), view.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

pub fn export_summary_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export summary")
        .add_filter("JSON", &["json"])
        .set_file_name("switch_summary.json")
        .save_file();

    if let Some(path) = file {
        match state.export_summary(&path) {
            Ok(()) => log::info!("Exported summary to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export summary: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
