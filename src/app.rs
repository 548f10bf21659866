use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ComparisonPlotApp {
    pub state: AppState,
}

impl ComparisonPlotApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ComparisonPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // Charts only read state; taps are applied once everything is drawn.
        let mut tap = None;

        // ---- Bottom panel: flat data table ----
        let has_rows = self.state.table.as_ref().is_some_and(|t| !t.is_empty());
        if self.state.settings.show_table && has_rows {
            egui::TopBottomPanel::bottom("data_table")
                .resizable(true)
                .default_height(200.0)
                .show(ctx, |ui| {
                    tap = table::data_table(ui, &self.state);
                });
        }

        // ---- Central panel: comparison charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            tap = tap.or(plot::comparison_view(ui, &self.state));
        });

        if let Some(plot::Tap(target)) = tap {
            self.state.tap(target);
        }
    }
}
