use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::data::summary::TOP_DURATIONS_RANGE;
use crate::state::{AppState, Dimension};

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

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            year_filter(ui, state);
            value_filter(ui, state, Dimension::Status, "Status");
            value_filter(ui, state, Dimension::Municipality, "Municipality");

            ui.separator();
            display_options(ui, state);
        });
}

/// Year checkboxes (integer dimension, kept separate from the string ones).
fn year_filter(ui: &mut Ui, state: &mut AppState) {
    let Some(ds) = &state.dataset else { return };
    let all_years: Vec<i32> = ds.years.iter().copied().collect();
    let n_selected = state.selection.years.len();
    let header = filter_header("Year", n_selected, all_years.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("filter_year")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            all_none_buttons(ui, state, Dimension::Year);
            for year in all_years {
                let mut checked = state.selection.years.contains(&year);
                if ui.checkbox(&mut checked, year.to_string()).changed() {
                    state.toggle_year(year);
                }
            }
        });
}

/// Checkbox list for a string-valued dimension (status, municipality).
fn value_filter(ui: &mut Ui, state: &mut AppState, dimension: Dimension, label: &str) {
    let Some(ds) = &state.dataset else { return };
    let all_values: Vec<String> = match dimension {
        Dimension::Status => ds.statuses.iter().cloned().collect(),
        Dimension::Municipality => ds.municipalities.iter().cloned().collect(),
        Dimension::Year => return,
    };
    let selected = match dimension {
        Dimension::Status => &state.selection.statuses,
        Dimension::Municipality => &state.selection.municipalities,
        Dimension::Year => return,
    };
    let header = filter_header(label, selected.len(), all_values.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(label)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            all_none_buttons(ui, state, dimension);
            for value in &all_values {
                let mut checked = match dimension {
                    Dimension::Status => state.selection.statuses.contains(value),
                    Dimension::Municipality => state.selection.municipalities.contains(value),
                    Dimension::Year => false,
                };
                if ui.checkbox(&mut checked, value).changed() {
                    state.toggle_value(dimension, value);
                }
            }
        });
}

/// "Year  (all)" when unrestricted, "Year  (2/4)" otherwise.
fn filter_header(label: &str, n_selected: usize, n_total: usize) -> String {
    if n_selected == 0 || n_selected == n_total {
        format!("{label}  (all)")
    } else {
        format!("{label}  ({n_selected}/{n_total})")
    }
}

fn all_none_buttons(ui: &mut Ui, state: &mut AppState, dimension: Dimension) {
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all(dimension);
        }
        if ui.small_button("None").clicked() {
            state.select_none(dimension);
        }
    });
}

/// Top-N sliders for the frequency and duration tables.
fn display_options(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Display");

    let mut top_n = state.options.top_n;
    ui.add(Slider::new(&mut top_n, 5..=20).text("Top-N entries"));

    let mut top_durations = state.options.top_durations;
    ui.add(
        Slider::new(
            &mut top_durations,
            *TOP_DURATIONS_RANGE.start()..=*TOP_DURATIONS_RANGE.end(),
        )
        .text("Longest cases"),
    );

    if top_n != state.options.top_n || top_durations != state.options.top_durations {
        state.options.top_n = top_n;
        state.options.top_durations = top_durations;
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
            if ui.button("Reload").clicked() {
                state.reload_if_changed();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
            if !state.selection.is_unrestricted(ds) {
                ui.label(RichText::new("filtered").italics());
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open case records")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_from_path(&path);
    }
}
