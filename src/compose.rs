//! View composition: turn the visible rows of a table into per-group chart
//! geometry.
//!
//! Nothing here touches `egui`; the UI layer only maps the resulting marks
//! onto plot items. Charts come out in first-appearance order of their group
//! and each chart's vertical axis lists that group's parameters, the first
//! one at the top.

use std::collections::HashMap;

use clap::ValueEnum;
use eframe::egui::Color32;

use crate::color::ColorMap;
use crate::data::model::{ComparisonTable, ParameterEstimate, RowId};

/// Height of an interval band, in category units.
pub const BAND_HEIGHT: f64 = 0.3;

/// Share of a category that dodged marks spread across.
const DODGE_SPAN: f64 = 0.8;

/// Ordering of parameters along a chart's vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ParamOrder {
    /// Order in which parameters first appear in the table.
    #[default]
    First,
    /// Lexicographic order.
    Sorted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeOptions {
    pub param_order: ParamOrder,
    /// Offset models vertically inside a category so marks do not overlap.
    pub dodge: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            param_order: ParamOrder::First,
            dodge: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Chart geometry
// ---------------------------------------------------------------------------

/// Rectangle spanning a confidence interval, in plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Band {
    pub fn corners(&self) -> Vec<[f64; 2]> {
        vec![
            [self.left, self.bottom],
            [self.right, self.bottom],
            [self.right, self.top],
            [self.left, self.top],
        ]
    }
}

/// One row drawn in a group chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub row: RowId,
    /// Vertical position: the category centre, shifted when dodging.
    pub y: f64,
    pub value: f64,
    pub band: Option<Band>,
    pub color: Color32,
}

/// A chart for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupChart {
    pub group: String,
    /// Axis categories, top to bottom.
    pub params: Vec<String>,
    pub marks: Vec<Mark>,
}

impl GroupChart {
    /// Horizontal extent covering every point and band.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let values = self.marks.iter().flat_map(|m| {
            let band = m.band.map(|b| [b.left, b.right]);
            std::iter::once(m.value).chain(band.into_iter().flatten())
        });
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        (min <= max).then_some((min, max))
    }
}

/// Models × parameters grid showing which model reports which parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverviewChart {
    pub models: Vec<String>,
    pub params: Vec<String>,
    pub cells: Vec<OverviewCell>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewCell {
    pub row: RowId,
    pub x: f64,
    pub y: f64,
}

impl OverviewChart {
    pub fn model_at(&self, x: f64) -> Option<&str> {
        category_at(&self.models, x, false)
    }

    pub fn param_at(&self, y: f64) -> Option<&str> {
        category_at(&self.params, y, true)
    }
}

/// Everything the UI needs to draw the visible rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composition {
    pub charts: Vec<GroupChart>,
    pub overview: OverviewChart,
    /// Population standard deviation of each parameter's point estimates
    /// across the visible models.
    pub spread: HashMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Partition the visible rows by group and lay out one chart per group.
pub fn compose(
    table: &ComparisonTable,
    visible: &[RowId],
    colors: &ColorMap,
    options: &ComposeOptions,
) -> Composition {
    let rows: Vec<(RowId, &ParameterEstimate)> = visible
        .iter()
        .filter_map(|&id| table.row(id).map(|r| (id, r)))
        .collect();

    let mut group_order: Vec<&str> = Vec::new();
    let mut by_group: HashMap<&str, Vec<(RowId, &ParameterEstimate)>> = HashMap::new();
    for &(id, row) in &rows {
        let group = row.group_label();
        by_group
            .entry(group)
            .or_insert_with(|| {
                group_order.push(group);
                Vec::new()
            })
            .push((id, row));
    }

    let charts: Vec<GroupChart> = group_order
        .iter()
        .map(|group| group_chart(group, &by_group[group], colors, options))
        .collect();

    let overview = overview_chart(&rows, options.param_order);
    let spread = cross_model_spread(&rows);

    log::debug!(
        "Composed {} charts from {} visible rows",
        charts.len(),
        rows.len()
    );

    Composition {
        charts,
        overview,
        spread,
    }
}

fn group_chart(
    group: &str,
    rows: &[(RowId, &ParameterEstimate)],
    colors: &ColorMap,
    options: &ComposeOptions,
) -> GroupChart {
    let params = ordered(rows.iter().map(|(_, r)| r.param_name.as_str()), options.param_order);
    let models = ordered(rows.iter().map(|(_, r)| r.model.as_str()), ParamOrder::First);

    let n_models = models.len().max(1);
    let slot = if options.dodge {
        DODGE_SPAN / n_models as f64
    } else {
        0.0
    };
    let half_band = if options.dodge {
        BAND_HEIGHT.min(slot * 0.6) / 2.0
    } else {
        BAND_HEIGHT / 2.0
    };

    let marks = rows
        .iter()
        .map(|&(id, row)| {
            let param_index = position(&params, &row.param_name);
            let model_index = position(&models, &row.model);
            let centre = axis_position(params.len(), param_index);
            let offset = (model_index as f64 - (n_models as f64 - 1.0) / 2.0) * slot;
            let y = centre - offset;

            Mark {
                row: id,
                y,
                value: row.param_value,
                band: row.interval().map(|ci| Band {
                    left: ci.lower,
                    right: ci.upper,
                    bottom: y - half_band,
                    top: y + half_band,
                }),
                color: colors.color_for(row.color.as_deref()),
            }
        })
        .collect();

    GroupChart {
        group: group.to_string(),
        params,
        marks,
    }
}

fn overview_chart(rows: &[(RowId, &ParameterEstimate)], order: ParamOrder) -> OverviewChart {
    let models = ordered(rows.iter().map(|(_, r)| r.model.as_str()), ParamOrder::First);
    let params = ordered(rows.iter().map(|(_, r)| r.param_name.as_str()), order);

    let cells = rows
        .iter()
        .map(|&(id, row)| OverviewCell {
            row: id,
            x: position(&models, &row.model) as f64,
            y: axis_position(params.len(), position(&params, &row.param_name)),
        })
        .collect();

    OverviewChart {
        models,
        params,
        cells,
    }
}

fn cross_model_spread(rows: &[(RowId, &ParameterEstimate)]) -> HashMap<String, f64> {
    let mut values: HashMap<&str, Vec<f64>> = HashMap::new();
    for (_, row) in rows {
        values
            .entry(row.param_name.as_str())
            .or_default()
            .push(row.param_value);
    }
    values
        .into_iter()
        .map(|(param, vs)| {
            let n = vs.len() as f64;
            let mean = vs.iter().sum::<f64>() / n;
            let var = vs.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            (param.to_string(), var.sqrt())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Hover details
// ---------------------------------------------------------------------------

/// Tooltip lines for a hovered row: `(label, value)` pairs.
pub fn hover_details(row: &ParameterEstimate, spread: Option<f64>) -> Vec<(&'static str, String)> {
    let interval = row
        .interval()
        .map(|ci| format!("({:.3}, {:.3})", ci.lower, ci.upper))
        .unwrap_or_else(|| "n/a".to_string());
    let std = row
        .std
        .map(|s| format!("{s:.4}"))
        .unwrap_or_else(|| "n/a".to_string());

    let mut lines = vec![
        ("parameter", row.param_name.clone()),
        ("parameter value", format!("{}", row.param_value)),
        ("model", row.model.clone()),
        ("confidence interval", interval),
        ("standard deviation", std),
    ];
    if let Some(spread) = spread {
        lines.push(("spread across models", format!("{spread:.4}")));
    }
    lines
}

// -- helpers --

fn axis_position(n: usize, index: usize) -> f64 {
    (n - 1 - index) as f64
}

/// Category whose centre is at `v`. Categories sit at `0, 1, ..`; with
/// `reversed` the first category is the highest one.
pub fn category_at(categories: &[String], v: f64, reversed: bool) -> Option<&str> {
    let rounded = v.round();
    if (v - rounded).abs() > 1e-6 || rounded < 0.0 || rounded >= categories.len() as f64 {
        return None;
    }
    let mut index = rounded as usize;
    if reversed {
        index = categories.len() - 1 - index;
    }
    categories.get(index).map(String::as_str)
}

/// Distinct values in the requested order.
fn ordered<'a>(values: impl Iterator<Item = &'a str>, order: ParamOrder) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.iter().any(|o| o == v) {
            out.push(v.to_string());
        }
    }
    if order == ParamOrder::Sorted {
        out.sort();
    }
    out
}

fn position(values: &[String], v: &str) -> usize {
    values.iter().position(|x| x == v).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::color::DEFAULT_COLOR;
    use crate::data::model::DEFAULT_GROUP;

    fn all_rows(table: &ComparisonTable) -> Vec<RowId> {
        table.iter().map(|(id, _)| id).collect()
    }

    fn no_dodge() -> ComposeOptions {
        ComposeOptions {
            dodge: false,
            ..ComposeOptions::default()
        }
    }

    fn sample() -> ComparisonTable {
        ComparisonTable::from_rows(vec![
            ParameterEstimate::new("ols", "beta", 1.0)
                .with_bounds(0.5, 1.5)
                .with_group("slopes"),
            ParameterEstimate::new("ols", "alpha", 0.2).with_group("intercepts"),
            ParameterEstimate::new("iv", "gamma", 3.0)
                .with_bounds(2.0, 4.0)
                .with_group("slopes"),
            ParameterEstimate::new("iv", "beta", 1.2)
                .with_bounds(0.9, 1.5)
                .with_group("slopes"),
        ])
        .unwrap()
    }

    #[test]
    fn one_chart_per_group_in_first_appearance_order() {
        let t = sample();
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &no_dodge());

        let groups: Vec<&str> = c.charts.iter().map(|c| c.group.as_str()).collect();
        assert_eq!(groups, ["slopes", "intercepts"]);
        assert_eq!(c.charts[0].params, ["beta", "gamma"]);
        assert_eq!(c.charts[0].marks.len(), 3);
        assert_eq!(c.charts[1].params, ["alpha"]);
    }

    #[test]
    fn sorted_param_order() {
        let t = ComparisonTable::from_rows(vec![
            ParameterEstimate::new("m", "c", 1.0),
            ParameterEstimate::new("m", "a", 1.0),
            ParameterEstimate::new("m", "b", 1.0),
        ])
        .unwrap();
        let options = ComposeOptions {
            param_order: ParamOrder::Sorted,
            dodge: false,
        };
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &options);
        assert_eq!(c.charts[0].params, ["a", "b", "c"]);
        assert_eq!(category_at(&c.charts[0].params, 2.0, true), Some("a"));
        assert_eq!(category_at(&c.charts[0].params, 0.0, true), Some("c"));
        assert_eq!(category_at(&c.charts[0].params, 0.5, true), None);
        assert_eq!(category_at(&c.charts[0].params, 3.0, true), None);
    }

    #[test]
    fn marks_sit_on_their_category_without_dodge() {
        let t = sample();
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &no_dodge());
        let slopes = &c.charts[0];

        let beta_ols = slopes.marks.iter().find(|m| m.row == RowId(0)).unwrap();
        assert_eq!(beta_ols.y, 1.0);
        assert_eq!(
            beta_ols.band,
            Some(Band {
                left: 0.5,
                right: 1.5,
                bottom: 1.0 - BAND_HEIGHT / 2.0,
                top: 1.0 + BAND_HEIGHT / 2.0,
            })
        );
        assert_eq!(beta_ols.color, DEFAULT_COLOR);

        let gamma_iv = slopes.marks.iter().find(|m| m.row == RowId(2)).unwrap();
        assert_eq!(gamma_iv.y, 0.0);
    }

    #[test]
    fn rows_without_bounds_have_no_band() {
        let t = sample();
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &no_dodge());
        assert_eq!(c.charts[1].marks[0].band, None);
    }

    #[test]
    fn dodging_separates_models_within_a_category() {
        let t = sample();
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &ComposeOptions::default());
        let slopes = &c.charts[0];

        let ols = slopes.marks.iter().find(|m| m.row == RowId(0)).unwrap();
        let iv = slopes.marks.iter().find(|m| m.row == RowId(3)).unwrap();
        assert!(ols.y > iv.y, "first model is drawn above the second");
        assert!((ols.y - 1.0 - 0.2).abs() < 1e-12);
        assert!((iv.y - 1.0 + 0.2).abs() < 1e-12);

        let band = ols.band.unwrap();
        assert!(band.top - band.bottom <= BAND_HEIGHT);
        assert!(band.bottom > iv.band.unwrap().top);
    }

    #[test]
    fn filtered_rows_are_left_out() {
        let t = sample();
        let c = compose(&t, &[RowId(1)], &ColorMap::new(&[]), &no_dodge());
        assert_eq!(c.charts.len(), 1);
        assert_eq!(c.charts[0].group, "intercepts");
        assert_eq!(c.overview.models, ["ols"]);
    }

    #[test]
    fn overview_grid() {
        let t = sample();
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &no_dodge());
        let o = &c.overview;

        assert_eq!(o.models, ["ols", "iv"]);
        assert_eq!(o.params, ["beta", "alpha", "gamma"]);
        assert_eq!(o.cells.len(), 4);
        assert_eq!(o.model_at(1.0), Some("iv"));
        assert_eq!(o.param_at(2.0), Some("beta"));
        assert_eq!(o.param_at(0.0), Some("gamma"));

        let iv_beta = o.cells.iter().find(|c| c.row == RowId(3)).unwrap();
        assert_eq!((iv_beta.x, iv_beta.y), (1.0, 2.0));
    }

    #[test]
    fn spread_is_population_std_across_models() {
        let t = sample();
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &no_dodge());
        assert!((c.spread["beta"] - 0.1).abs() < 1e-12);
        assert_eq!(c.spread["alpha"], 0.0);
    }

    #[test]
    fn x_range_covers_bands() {
        let t = sample();
        let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &no_dodge());
        assert_eq!(c.charts[0].x_range(), Some((0.5, 4.0)));
    }

    #[test]
    fn colour_tags_resolve_through_the_map() {
        let t = ComparisonTable::from_rows(vec![
            ParameterEstimate::new("m", "a", 1.0).with_color("#ff0000"),
            ParameterEstimate::new("m", "b", 1.0),
        ])
        .unwrap();
        let colors = ColorMap::new(t.color_tags());
        let c = compose(&t, &all_rows(&t), &colors, &no_dodge());
        assert_eq!(c.charts[0].marks[0].color, Color32::from_rgb(255, 0, 0));
        assert_eq!(c.charts[0].marks[1].color, DEFAULT_COLOR);
    }

    #[test]
    fn hover_lines() {
        let t = sample();
        let lines = hover_details(&t.rows()[0], Some(0.1));
        assert!(lines.contains(&("parameter value", "1".to_string())));
        assert!(lines.contains(&("model", "ols".to_string())));
        assert!(lines.contains(&("confidence interval", "(0.500, 1.500)".to_string())));
        assert!(lines.contains(&("standard deviation", "0.2500".to_string())));
        assert!(lines.contains(&("spread across models", "0.1000".to_string())));

        let no_ci = hover_details(&t.rows()[1], None);
        assert!(no_ci.contains(&("confidence interval", "n/a".to_string())));
        assert_eq!(no_ci.len(), 5);
    }

    fn arb_rows() -> impl Strategy<Value = Vec<ParameterEstimate>> {
        prop::collection::vec((0usize..3, 0usize..4, -10.0..10.0_f64), 1..12).prop_map(|cells| {
            let mut seen = std::collections::HashSet::new();
            cells
                .into_iter()
                .filter(|(m, p, _)| seen.insert((*m, *p)))
                .map(|(m, p, v)| ParameterEstimate::new(format!("m{m}"), format!("p{p}"), v))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn missing_group_behaves_like_all(rows in arb_rows()) {
            let ungrouped = ComparisonTable::from_rows(rows.clone()).unwrap();
            let grouped = ComparisonTable::from_rows(
                rows.into_iter().map(|r| r.with_group(DEFAULT_GROUP)).collect(),
            )
            .unwrap();

            let colors = ColorMap::new(&[]);
            let options = ComposeOptions::default();
            let a = compose(&ungrouped, &all_rows(&ungrouped), &colors, &options);
            let b = compose(&grouped, &all_rows(&grouped), &colors, &options);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn every_visible_row_gets_exactly_one_mark(rows in arb_rows()) {
            let t = ComparisonTable::from_rows(rows).unwrap();
            let c = compose(&t, &all_rows(&t), &ColorMap::new(&[]), &ComposeOptions::default());
            let marks: usize = c.charts.iter().map(|c| c.marks.len()).sum();
            prop_assert_eq!(marks, t.len());
        }
    }
}
