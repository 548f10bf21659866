use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::compose::{ComposeOptions, ParamOrder};
use crate::data::filter::FilterColumn;
use crate::selection::{LinkMode, Selection};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filters, colours, view options
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(table) = &state.table else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns: Vec<(FilterColumn, Vec<String>)> = FilterColumn::ALL
        .iter()
        .map(|col| (*col, col.values(table).to_vec()))
        .collect();
    let legend = state.color_map.legend_entries();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (col, all_values) in &columns {
                let n_selected = state.filters.get(col).map_or(all_values.len(), |s| s.len());
                let header_text = format!("{col}  ({n_selected}/{})", all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col.to_string())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(*col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(*col);
                            }
                        });

                        for val in all_values {
                            let mut checked = state
                                .filters
                                .get(col)
                                .map_or(true, |s| s.contains(val));
                            if ui.checkbox(&mut checked, val.as_str()).changed() {
                                state.toggle_filter_value(*col, val);
                            }
                        }
                    });
            }

            if !legend.is_empty() {
                ui.separator();
                ui.strong("Colors");
                for (tag, color) in &legend {
                    ui.label(RichText::new(format!("● {tag}")).color(*color));
                }
            }

            ui.separator();
            view_options(ui, state);
        });
}

fn view_options(ui: &mut Ui, state: &mut AppState) {
    ui.strong("View");

    let mut options: ComposeOptions = state.settings.compose;
    egui::ComboBox::from_id_salt("param_order")
        .selected_text(match options.param_order {
            ParamOrder::First => "Parameters: table order",
            ParamOrder::Sorted => "Parameters: sorted",
        })
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut options.param_order, ParamOrder::First, "Table order");
            ui.selectable_value(&mut options.param_order, ParamOrder::Sorted, "Sorted");
        });
    ui.checkbox(&mut options.dodge, "Offset models within a parameter");
    state.set_compose_options(options);

    let mut link = state.settings.link;
    egui::ComboBox::from_id_salt("link_mode")
        .selected_text(match link {
            LinkMode::Model => "Tap selects: whole model",
            LinkMode::Row => "Tap selects: single point",
        })
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut link, LinkMode::Model, "Whole model");
            ui.selectable_value(&mut link, LinkMode::Row, "Single point");
        });
    if link != state.settings.link {
        state.set_link_mode(link);
    }

    ui.checkbox(&mut state.settings.show_overview, "Show model overview");
    ui.checkbox(&mut state.settings.show_table, "Show data table");
    ui.add(
        egui::Slider::new(&mut state.settings.chart_height, 120.0..=800.0).text("Chart height"),
    );
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
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} estimates from {} models, {} visible",
                table.len(),
                table.models().len(),
                state.visible_rows.len()
            ));
            if let Some(path) = &state.source {
                ui.label(RichText::new(path.display().to_string()).weak());
            }
        }

        ui.separator();

        if let Selection::Row(row) = state.selection.selection() {
            let model = state
                .table
                .as_ref()
                .and_then(|t| t.row(row))
                .map(|r| r.model.clone())
                .unwrap_or_default();
            ui.label(format!(
                "Selected: {model} ({} highlighted)",
                state.selection.highlighted().len()
            ));
            if ui.small_button("Clear selection").clicked() {
                state.tap(None);
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open model estimates")
        .add_filter("Supported files", &["json", "csv", "parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
