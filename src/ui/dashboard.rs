use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Plot};

use crate::data::aggregate::{GroupTotal, TopTitles};
use crate::data::kpi::KpiBundle;
use crate::state::AppState;

const BAR_COLOR: Color32 = Color32::from_rgb(0xff, 0x45, 0x54);
const HEADLINE_COLOR: Color32 = Color32::from_rgb(0x21, 0xc3, 0x54);
const MAX_AXIS_LABEL: usize = 16;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render KPIs, the best-sellers chart and the per-group tables.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading(RichText::new("🎮 Top Switch Games Dashboard").size(26.0).strong());
    ui.add_space(8.0);

    let Some(summary) = &state.summary else {
        ui.centered_and_justified(|ui: &mut Ui| match &state.status_message {
            Some(msg) => {
                ui.label(RichText::new(msg).color(Color32::RED).size(16.0));
            }
            None => {
                ui.heading("Open a file to view sales  (File → Open…)");
            }
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            kpi_metrics(ui, &summary.kpis);
            ui.add_space(24.0);

            top_titles_chart(ui, &summary.top_titles, state.config.top_n);
            ui.add_space(16.0);

            ui.columns(2, |cols| {
                group_table(&mut cols[0], "Total Sales by Developer 🏆", "developer", &summary.by_developer);
                group_table(&mut cols[1], "Total Sales by Publisher 🎉", "publisher", &summary.by_publisher);
            });
        });
}

fn kpi_metrics(ui: &mut Ui, kpis: &KpiBundle) {
    ui.heading("KPI Metrics");
    ui.columns(4, |cols| {
        for (col, (label, value)) in cols.iter_mut().zip(kpis.metrics()) {
            col.group(|ui: &mut Ui| {
                ui.set_min_width(ui.available_width());
                ui.label(RichText::new(label).weak());
                ui.label(RichText::new(value).size(28.0).strong());
            });
        }
    });
}

fn top_titles_chart(ui: &mut Ui, top: &TopTitles, top_n: usize) {
    ui.heading(format!("Top {top_n} Games 🕹️"));
    if let Some(headline) = top.headline() {
        ui.label(RichText::new(headline).color(HEADLINE_COLOR));
    }

    let labels: Vec<String> = top.ranked.iter().map(|t| axis_label(&t.title)).collect();
    let bars: Vec<Bar> = top
        .ranked
        .iter()
        .enumerate()
        .map(|(i, t)| {
            Bar::new(i as f64, t.copies_sold)
                .name(&t.title)
                .fill(BAR_COLOR)
                .width(0.7)
        })
        .collect();

    Plot::new("top_titles")
        .height(320.0)
        .y_axis_label("copies_sold")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name("copies_sold"));
        });
}

fn group_table(ui: &mut Ui, heading: &str, column: &str, rows: &[GroupTotal]) {
    ui.heading(heading);
    ui.push_id(column, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::initial(200.0).at_least(80.0).clip(true))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong(column);
                });
                header.col(|ui| {
                    ui.strong("copies_sold");
                });
            })
            .body(|mut body| {
                for g in rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(&g.group);
                        });
                        row.col(|ui| {
                            ui.label(format_copies(g.copies_sold));
                        });
                    });
                }
            });
    });
}

/// Shorten long titles so neighbouring axis labels don't overlap.
fn axis_label(title: &str) -> String {
    if title.chars().count() <= MAX_AXIS_LABEL {
        return title.to_string();
    }
    let mut short: String = title.chars().take(MAX_AXIS_LABEL - 1).collect();
    short.push('…');
    short
}

/// `57460000.0` → `"57,460,000"`.
fn format_copies(v: f64) -> String {
    let digits = format!("{:.0}", v.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if v < 0.0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_get_thousands_separators() {
        assert_eq!(format_copies(57_460_000.0), "57,460,000");
        assert_eq!(format_copies(999.0), "999");
        assert_eq!(format_copies(1_000.4), "1,000");
        assert_eq!(format_copies(0.0), "0");
    }

    #[test]
    fn long_titles_are_shortened() {
        assert_eq!(axis_label("Minecraft"), "Minecraft");
        let short = axis_label("The Legend of Zelda: Breath of the Wild");
        assert_eq!(short.chars().count(), MAX_AXIS_LABEL);
        assert!(short.ends_with('…'));
    }
}
