use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::SELECTION_COLOR;
use crate::selection::Emphasis;
use crate::state::AppState;

use super::plot::Tap;

// ---------------------------------------------------------------------------
// Flat table view (bottom panel)
// ---------------------------------------------------------------------------

const HEADERS: [&str; 8] = [
    "model",
    "param_name",
    "param_value",
    "ci_lower",
    "ci_upper",
    "std",
    "group",
    "color",
];

/// Render the visible rows of the flat table. Clicking a row selects it
/// exactly like tapping its mark.
pub fn data_table(ui: &mut Ui, state: &AppState) -> Option<Tap> {
    let Some(table) = &state.table else {
        return None;
    };

    let mut tap = None;
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .sense(egui::Sense::click())
        .column(Column::auto().at_least(80.0))
        .columns(Column::auto().at_least(60.0), HEADERS.len() - 1)
        .header(20.0, |mut header| {
            for name in HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, state.visible_rows.len(), |mut row| {
                let id = state.visible_rows[row.index()];
                let Some(r) = table.row(id) else {
                    return;
                };
                let highlighted = state.selection.emphasis(id) == Emphasis::Highlighted;
                row.set_selected(highlighted);

                let cells = [
                    r.model.clone(),
                    r.param_name.clone(),
                    format!("{}", r.param_value),
                    fmt_opt(r.ci_lower, 3),
                    fmt_opt(r.ci_upper, 3),
                    fmt_opt(r.std, 4),
                    r.group_label().to_string(),
                    r.color.clone().unwrap_or_default(),
                ];
                for (i, text) in cells.into_iter().enumerate() {
                    row.col(|ui: &mut Ui| {
                        let mut text = RichText::new(text);
                        if i == 0 && highlighted {
                            text = text.color(SELECTION_COLOR);
                        }
                        ui.label(text);
                    });
                }

                if row.response().clicked() {
                    tap = Some(Tap(Some(id)));
                }
            });
        });
    tap
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
}
