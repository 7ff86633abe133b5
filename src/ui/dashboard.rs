use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};
use egui_extras::{Column, TableBuilder};

use crate::data::model::CaseDataset;
use crate::data::summary::{FrequencyEntry, Summary};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel – KPI row, charts, record tables
// ---------------------------------------------------------------------------

/// Render the dashboard in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a file to view case records  (File → Open…)");
            });
            return;
        }
    };

    let summary = match &state.summary {
        Some(s) => s,
        None => {
            // Empty result: no aggregates were computed, show the notice.
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No records match the current filters");
            });
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            kpi_row(ui, summary);
            ui.add_space(8.0);

            ui.columns(2, |cols: &mut [Ui]| {
                monthly_trend_chart(&mut cols[0], summary);
                status_chart(&mut cols[1], state, summary);
            });
            ui.columns(2, |cols: &mut [Ui]| {
                frequency_chart(
                    &mut cols[0],
                    "top_municipalities",
                    "Top Municipalities",
                    &summary.top_municipalities,
                );
                frequency_chart(
                    &mut cols[1],
                    "top_subjects",
                    "Top Subjects",
                    &summary.top_subjects,
                );
            });

            frequency_chart(ui, "top_protocols", "Top Protocols", &summary.top_protocols);

            if !summary.duration_histogram.is_empty() {
                duration_histogram_chart(ui, summary);
                ui.add_space(8.0);
                longest_cases_table(ui, dataset, summary);
            }

            ui.add_space(8.0);
            record_table(ui, state, dataset);
        });
}

// ---------------------------------------------------------------------------
// KPI row
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, summary: &Summary) {
    ui.columns(4, |cols: &mut [Ui]| {
        kpi_card(&mut cols[0], "Total Processes", summary.kpis.distinct_protocols.to_string());
        kpi_card(
            &mut cols[1],
            "Municipalities",
            summary.kpis.distinct_municipalities.to_string(),
        );
        kpi_card(&mut cols[2], "Subjects", summary.kpis.distinct_subjects.to_string());
        let mean = match summary.kpis.mean_duration_days {
            Some(days) => format!("{days:.1} days"),
            None => "–".to_string(),
        };
        kpi_card(&mut cols[3], "Mean Duration", mean);
    });
}

fn kpi_card(ui: &mut Ui, label: &str, value: String) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(label);
            ui.label(RichText::new(value).size(26.0).strong());
        });
    });
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn monthly_trend_chart(ui: &mut Ui, summary: &Summary) {
    ui.strong("Processes per Month");
    let labels: Vec<String> = summary
        .monthly_trend
        .iter()
        .map(|&(m, _)| m.abbrev().to_string())
        .collect();
    let bars: Vec<Bar> = summary
        .monthly_trend
        .iter()
        .enumerate()
        .map(|(i, &(month, count))| {
            Bar::new(i as f64, count as f64)
                .width(0.6)
                .name(month.name())
                .fill(Color32::LIGHT_BLUE)
        })
        .collect();
    category_bar_plot(ui, "monthly_trend", labels, bars, false);
}

fn status_chart(ui: &mut Ui, state: &AppState, summary: &Summary) {
    ui.strong("Status Distribution");
    let labels: Vec<String> = summary
        .status_distribution
        .iter()
        .map(|e| e.value.clone())
        .collect();
    let bars: Vec<Bar> = summary
        .status_distribution
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let color = state
                .status_colors
                .as_ref()
                .map(|c| c.color_for(&entry.value))
                .unwrap_or(Color32::GRAY);
            Bar::new(i as f64, entry.count as f64)
                .width(0.6)
                .name(&entry.value)
                .fill(color)
        })
        .collect();
    category_bar_plot(ui, "status_distribution", labels, bars, true);
}

fn frequency_chart(ui: &mut Ui, id: &str, title: &str, entries: &[FrequencyEntry]) {
    ui.strong(title);
    let labels: Vec<String> = entries.iter().map(|e| truncate_label(&e.value)).collect();
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Bar::new(i as f64, entry.count as f64)
                .width(0.6)
                .name(&entry.value)
                .fill(Color32::LIGHT_GREEN)
        })
        .collect();
    category_bar_plot(ui, id, labels, bars, false);
}

fn duration_histogram_chart(ui: &mut Ui, summary: &Summary) {
    ui.strong("Processing Time (days)");
    let bars: Vec<Bar> = summary
        .duration_histogram
        .iter()
        .map(|bin| {
            let center = (bin.lower + bin.upper) as f64 / 2.0;
            let width = (bin.upper - bin.lower) as f64;
            Bar::new(center, bin.count as f64)
                .width(width * 0.95)
                .name(format!("{}–{} days", bin.lower, bin.upper))
                .fill(Color32::KHAKI)
        })
        .collect();
    Plot::new("duration_histogram")
        .height(200.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_axes([true, true])
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// A bar-chart plot over category indices 0..n with text axis labels.
fn category_bar_plot(ui: &mut Ui, id: &str, labels: Vec<String>, bars: Vec<Bar>, legend: bool) {
    let mut plot = Plot::new(id.to_string())
        .height(200.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            labels.get(i as usize).cloned().unwrap_or_default()
        });
    if legend {
        plot = plot.legend(Legend::default());
    }
    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars));
    });
}

fn truncate_label(s: &str) -> String {
    const MAX: usize = 12;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let head: String = s.chars().take(MAX - 1).collect();
        format!("{head}…")
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn longest_cases_table(ui: &mut Ui, dataset: &CaseDataset, summary: &Summary) {
    ui.strong("Longest-running Cases");
    ui.push_id("longest_cases", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::remainder())
            .column(Column::auto().at_least(70.0))
            .max_scroll_height(220.0)
            .header(20.0, |mut header| {
                for title in ["Protocol", "Entry", "Exit", "Subject", "Days"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                let rows = &summary.longest_cases;
                body.rows(18.0, rows.len(), |mut row| {
                    let rec = &dataset.records[rows[row.index()]];
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.protocol);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.entry_date.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.exit_date.map(|d| d.to_string()).unwrap_or_default());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.subject);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.duration_days.map(|d| d.to_string()).unwrap_or_default());
                    });
                });
            });
    });
}

fn record_table(ui: &mut Ui, state: &AppState, dataset: &CaseDataset) {
    ui.strong("Filtered Records");
    ui.push_id("record_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(110.0))
            .column(Column::remainder())
            .column(Column::auto().at_least(50.0))
            .max_scroll_height(320.0)
            .header(20.0, |mut header| {
                for title in ["Protocol", "Entry", "Status", "Municipality", "Subject", "Days"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                let rows = &state.visible_indices;
                body.rows(18.0, rows.len(), |mut row| {
                    let rec = &dataset.records[rows[row.index()]];
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.protocol);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.entry_date.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        let color = state
                            .status_colors
                            .as_ref()
                            .map(|c| c.color_for(&rec.status))
                            .unwrap_or(Color32::GRAY);
                        ui.label(RichText::new(&rec.status).color(color));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.municipality);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.subject);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.duration_days.map(|d| d.to_string()).unwrap_or_default());
                    });
                });
            });
    });
}
