use eframe::egui::{self, Color32, Pos2, Response, Stroke, Ui};
use egui_plot::{GridInput, GridMark, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Polygon};

use crate::color::{OVERVIEW_COLOR, SELECTION_COLOR};
use crate::compose::{category_at, hover_details, Composition, GroupChart, OverviewChart};
use crate::data::model::{ComparisonTable, RowId};
use crate::selection::{Emphasis, SelectionState};
use crate::state::AppState;

/// Pointer distance (screen points) within which a mark counts as hit.
const HIT_RADIUS: f32 = 8.0;

const MARKER_RADIUS: f32 = 4.0;

/// Overview height in points.
const OVERVIEW_HEIGHT: f32 = 150.0;

/// A click inside a chart: on a mark (`Some`) or on empty space (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tap(pub Option<RowId>);

// ---------------------------------------------------------------------------
// Mark styling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkStyle {
    pub point: Color32,
    /// `None` hides the interval band.
    pub band: Option<Color32>,
}

/// Colours for a mark given its base colour and selection emphasis.
pub fn mark_style(base: Color32, emphasis: Emphasis) -> MarkStyle {
    match emphasis {
        Emphasis::Normal => MarkStyle {
            point: base,
            band: Some(base.gamma_multiply(0.2)),
        },
        Emphasis::Highlighted => MarkStyle {
            point: SELECTION_COLOR,
            band: Some(SELECTION_COLOR.gamma_multiply(0.2)),
        },
        Emphasis::Faded => MarkStyle {
            point: base.gamma_multiply(0.2),
            band: None,
        },
    }
}

/// The row whose mark is closest to `pointer`, if within `max_distance`.
pub fn nearest_row(
    candidates: impl IntoIterator<Item = (RowId, Pos2)>,
    pointer: Pos2,
    max_distance: f32,
) -> Option<RowId> {
    candidates
        .into_iter()
        .map(|(row, pos)| (row, pos.distance(pointer)))
        .filter(|(_, d)| *d <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(row, _)| row)
}

/// Grid marks on the centres of `n` categories (`0..n`) that are in view.
fn category_spacer(n: usize) -> impl Fn(GridInput) -> Vec<GridMark> {
    move |input: GridInput| {
        let (lo, hi) = input.bounds;
        let last = n as f64 - 1.0;
        let start = lo.ceil().max(0.0);
        let end = hi.floor().min(last);
        if n == 0 || start > end {
            return Vec::new();
        }
        (start as usize..=end as usize)
            .map(|v| GridMark {
                value: v as f64,
                step_size: 1.0,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Comparison view (central panel)
// ---------------------------------------------------------------------------

/// Render the overview and every group chart, stacked vertically.
///
/// Returns the tap, if any chart was clicked this frame.
pub fn comparison_view(ui: &mut Ui, state: &AppState) -> Option<Tap> {
    let Some(table) = &state.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to compare models  (File → Open…)");
        });
        return None;
    };

    let composition = &state.composition;
    if composition.charts.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("All rows are filtered out.");
        });
        return None;
    }

    let mut tap = None;
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(&state.settings.title);

            if state.settings.show_overview {
                ui.strong("Models");
                tap = tap.or(overview_plot(ui, &composition.overview, &state.selection));
                ui.separator();
            }

            for chart in &composition.charts {
                ui.strong(&chart.group);
                let t = group_plot(
                    ui,
                    chart,
                    table,
                    composition,
                    &state.selection,
                    state.settings.chart_height,
                );
                tap = tap.or(t);
                ui.add_space(8.0);
            }
        });
    tap
}

/// One group chart: interval bands, estimate markers, hover tooltip and tap.
fn group_plot(
    ui: &mut Ui,
    chart: &GroupChart,
    table: &ComparisonTable,
    composition: &Composition,
    selection: &SelectionState,
    height: f32,
) -> Option<Tap> {
    let params = chart.params.clone();
    let n = chart.params.len() as f64;

    let mut plot = Plot::new(("group_plot", chart.group.as_str()))
        .height(height)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .include_y(-0.5)
        .include_y(n - 0.5)
        .y_grid_spacer(category_spacer(chart.params.len()))
        .y_axis_formatter(move |mark, _range| {
            category_at(&params, mark.value, true)
                .unwrap_or_default()
                .to_string()
        })
        .x_axis_label("Estimate")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if let Some((lo, hi)) = chart.x_range() {
        plot = plot.include_x(lo).include_x(hi);
    }

    let plot_response = plot.show(ui, |plot_ui| {
        // Bands first so markers stay on top.
        for mark in &chart.marks {
            let style = mark_style(mark.color, selection.emphasis(mark.row));
            if let (Some(band), Some(fill)) = (mark.band, style.band) {
                plot_ui.polygon(
                    Polygon::new(PlotPoints::new(band.corners()))
                        .fill_color(fill)
                        .stroke(Stroke::NONE),
                );
            }
        }
        for mark in &chart.marks {
            let style = mark_style(mark.color, selection.emphasis(mark.row));
            plot_ui.points(
                Points::new(vec![[mark.value, mark.y]])
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(MARKER_RADIUS)
                    .color(style.point),
            );
        }
    });

    let transform = plot_response.transform;
    let marks: Vec<(RowId, Pos2)> = chart
        .marks
        .iter()
        .map(|m| (m.row, transform.position_from_point(&PlotPoint::new(m.value, m.y))))
        .collect();

    interact(plot_response.response, &marks, |ui, row| {
        if let Some(r) = table.row(row) {
            details_grid(ui, &hover_details(r, composition.spread.get(&r.param_name).copied()));
        }
    })
}

/// Models × parameters grid; selection is shared with the group charts.
fn overview_plot(ui: &mut Ui, overview: &OverviewChart, selection: &SelectionState) -> Option<Tap> {
    let models = overview.models.clone();
    let params = overview.params.clone();

    let plot_response = Plot::new("overview_plot")
        .height(OVERVIEW_HEIGHT)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .include_x(-0.5)
        .include_x(overview.models.len() as f64 - 0.5)
        .include_y(-0.5)
        .include_y(overview.params.len() as f64 - 0.5)
        .x_grid_spacer(category_spacer(overview.models.len()))
        .y_grid_spacer(category_spacer(overview.params.len()))
        .x_axis_formatter(move |mark, _range| {
            category_at(&models, mark.value, false)
                .unwrap_or_default()
                .to_string()
        })
        .y_axis_formatter(move |mark, _range| {
            category_at(&params, mark.value, true)
                .unwrap_or_default()
                .to_string()
        })
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for cell in &overview.cells {
                let style = mark_style(OVERVIEW_COLOR, selection.emphasis(cell.row));
                plot_ui.points(
                    Points::new(vec![[cell.x, cell.y]])
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(MARKER_RADIUS)
                        .color(style.point),
                );
            }
        });

    let transform = plot_response.transform;
    let marks: Vec<(RowId, Pos2)> = overview
        .cells
        .iter()
        .map(|c| (c.row, transform.position_from_point(&PlotPoint::new(c.x, c.y))))
        .collect();

    interact(plot_response.response, &marks, |ui, row| {
        let labels = overview
            .cells
            .iter()
            .find(|c| c.row == row)
            .and_then(|c| Some((overview.model_at(c.x)?, overview.param_at(c.y)?)));
        if let Some((model, param)) = labels {
            details_grid(
                ui,
                &[("model", model.to_string()), ("parameter", param.to_string())],
            );
        }
    })
}

/// Shared hover + tap handling for a plot's response.
fn interact(
    response: Response,
    marks: &[(RowId, Pos2)],
    tooltip: impl FnOnce(&mut Ui, RowId),
) -> Option<Tap> {
    let hovered = response
        .hover_pos()
        .and_then(|p| nearest_row(marks.iter().copied(), p, HIT_RADIUS));

    let tap = if response.clicked() {
        let target = response
            .interact_pointer_pos()
            .and_then(|p| nearest_row(marks.iter().copied(), p, HIT_RADIUS))
            .or(hovered);
        Some(Tap(target))
    } else {
        None
    };

    if let Some(row) = hovered {
        response.on_hover_ui_at_pointer(|ui| tooltip(ui, row));
    }
    tap
}

fn details_grid(ui: &mut Ui, lines: &[(&str, String)]) {
    egui::Grid::new("hover_details")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            for (label, value) in lines {
                ui.strong(*label);
                ui.label(value);
                ui.end_row();
            }
        });
}
