use std::collections::HashSet;
use std::fmt;

use crate::error::BuildError;

/// Group label used for rows that do not name one.
pub const DEFAULT_GROUP: &str = "all";

// ---------------------------------------------------------------------------
// Interval – a validated (lower, upper) confidence bound pair
// ---------------------------------------------------------------------------

/// A confidence interval with finite bounds and `lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// Standard deviation implied by a Gaussian 95% interval: `(upper - lower) / 4`.
    pub fn std(&self) -> f64 {
        (self.upper - self.lower) / 4.0
    }

    /// Validate an optional bound pair for one `(model, param)` row.
    ///
    /// Both bounds absent is fine (no interval). One bound alone, a
    /// non-finite bound or `lower > upper` is rejected.
    pub fn from_bounds(
        model: &str,
        param: &str,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Option<Self>, BuildError> {
        let (lower, upper) = match (lower, upper) {
            (None, None) => return Ok(None),
            (Some(l), Some(u)) => (l, u),
            _ => {
                return Err(BuildError::UnpairedBound {
                    model: model.to_string(),
                    param: param.to_string(),
                })
            }
        };

        for (field, v) in [("ci_lower", lower), ("ci_upper", upper)] {
            if !v.is_finite() {
                return Err(BuildError::NonFinite {
                    model: model.to_string(),
                    param: param.to_string(),
                    field,
                });
            }
        }

        if lower > upper {
            return Err(BuildError::InvertedInterval {
                model: model.to_string(),
                param: param.to_string(),
                lower,
                upper,
            });
        }

        Ok(Some(Interval { lower, upper }))
    }
}

// ---------------------------------------------------------------------------
// Mapping input: model name → per-model parameter table
// ---------------------------------------------------------------------------

/// One row of a per-model table: a parameter and its estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    pub name: String,
    pub value: f64,
    pub interval: Option<Interval>,
}

impl ParameterRecord {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            interval: None,
        }
    }

    #[cfg(test)]
    pub fn with_interval(mut self, lower: f64, upper: f64) -> Self {
        self.interval = Some(Interval { lower, upper });
        self
    }
}

/// All parameter estimates reported by one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEstimates {
    pub model: String,
    pub params: Vec<ParameterRecord>,
}

impl ModelEstimates {
    pub fn new(model: impl Into<String>, params: Vec<ParameterRecord>) -> Self {
        Self {
            model: model.into(),
            params,
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterEstimate – one row of the flat comparison table
// ---------------------------------------------------------------------------

/// One `(model, parameter)` row in canonical flat form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEstimate {
    pub model: String,
    pub param_name: String,
    pub param_value: f64,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    pub group: Option<String>,
    pub color: Option<String>,
    /// Derived from the bounds; any incoming value is overwritten.
    pub std: Option<f64>,
}

impl ParameterEstimate {
    pub fn new(model: impl Into<String>, param_name: impl Into<String>, param_value: f64) -> Self {
        Self {
            model: model.into(),
            param_name: param_name.into(),
            param_value,
            ci_lower: None,
            ci_upper: None,
            group: None,
            color: None,
            std: None,
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.ci_lower = Some(lower);
        self.ci_upper = Some(upper);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Group label, falling back to [`DEFAULT_GROUP`].
    pub fn group_label(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_GROUP)
    }

    /// The confidence interval, when both bounds are present.
    pub fn interval(&self) -> Option<Interval> {
        match (self.ci_lower, self.ci_upper) {
            (Some(lower), Some(upper)) => Some(Interval { lower, upper }),
            _ => None,
        }
    }

    /// Check one row and fill in the derived `std` column.
    fn validate(&mut self, row: usize) -> Result<(), BuildError> {
        if self.model.trim().is_empty() {
            return Err(BuildError::BlankName { row, field: "model" });
        }
        if self.param_name.trim().is_empty() {
            return Err(BuildError::BlankName {
                row,
                field: "param_name",
            });
        }
        if !self.param_value.is_finite() {
            return Err(BuildError::NonFinite {
                model: self.model.clone(),
                param: self.param_name.clone(),
                field: "param_value",
            });
        }

        let interval =
            Interval::from_bounds(&self.model, &self.param_name, self.ci_lower, self.ci_upper)?;
        self.std = interval.map(|i| i.std());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RowId – positional identity of a row within one table
// ---------------------------------------------------------------------------

/// Index of a row in its [`ComparisonTable`]. Always `0..len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComparisonTable – the validated flat table
// ---------------------------------------------------------------------------

/// Validated flat table with one row per `(model, parameter)` pair and
/// pre-computed first-appearance indices of models, groups and colour tags.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    rows: Vec<ParameterEstimate>,
    models: Vec<String>,
    groups: Vec<String>,
    color_tags: Vec<String>,
}

impl ComparisonTable {
    /// Validate already-flat rows and derive the `std` column.
    pub fn from_rows(mut rows: Vec<ParameterEstimate>) -> Result<Self, BuildError> {
        if rows.is_empty() {
            return Err(BuildError::EmptyInput);
        }

        let mut seen: HashSet<(String, String)> = HashSet::with_capacity(rows.len());
        for (i, row) in rows.iter_mut().enumerate() {
            row.validate(i)?;
            if !seen.insert((row.model.clone(), row.param_name.clone())) {
                return Err(BuildError::DuplicateParameter {
                    model: row.model.clone(),
                    param: row.param_name.clone(),
                });
            }
        }

        let models = first_appearance(rows.iter().map(|r| r.model.as_str()));
        let groups = first_appearance(rows.iter().map(|r| r.group_label()));
        let color_tags = first_appearance(rows.iter().filter_map(|r| r.color.as_deref()));

        Ok(ComparisonTable {
            rows,
            models,
            groups,
            color_tags,
        })
    }

    pub fn rows(&self) -> &[ParameterEstimate] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&ParameterEstimate> {
        self.rows.get(id.0)
    }

    /// `(id, row)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (RowId, &ParameterEstimate)> {
        self.rows().iter().enumerate().map(|(i, r)| (RowId(i), r))
    }

    /// Distinct model names in order of first appearance.
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Distinct group labels (defaults included) in order of first appearance.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Distinct colour tags in order of first appearance.
    pub fn color_tags(&self) -> &[String] {
        &self.color_tags
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// False for every table that passed `from_rows`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn first_appearance<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_is_quarter_of_interval_width() {
        let table = ComparisonTable::from_rows(vec![
            ParameterEstimate::new("m", "a", 1.0).with_bounds(0.5, 1.5),
            ParameterEstimate::new("m", "b", 2.0),
        ])
        .unwrap();
        assert_eq!(table.rows()[0].std, Some(0.25));
        assert_eq!(table.rows()[1].std, None);
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
    }

    #[test]
    fn incoming_std_is_recomputed() {
        let mut row = ParameterEstimate::new("m", "a", 1.0).with_bounds(0.0, 2.0);
        row.std = Some(99.0);
        let table = ComparisonTable::from_rows(vec![row]).unwrap();
        assert_eq!(table.rows()[0].std, Some(0.5));
    }

    #[test]
    fn empty_rows_are_rejected() {
        assert_eq!(ComparisonTable::from_rows(vec![]), Err(BuildError::EmptyInput));
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let err = ComparisonTable::from_rows(vec![
            ParameterEstimate::new("m", "a", 1.0),
            ParameterEstimate::new("m", "a", 2.0),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateParameter {
                model: "m".into(),
                param: "a".into()
            }
        );
    }

    #[test]
    fn same_parameter_in_different_models_is_fine() {
        let table = ComparisonTable::from_rows(vec![
            ParameterEstimate::new("m1", "a", 1.0),
            ParameterEstimate::new("m2", "a", 2.0),
        ])
        .unwrap();
        assert_eq!(table.models(), ["m1", "m2"]);
    }

    #[test]
    fn bound_checks() {
        let one_sided = ParameterEstimate {
            ci_lower: Some(0.0),
            ..ParameterEstimate::new("m", "a", 1.0)
        };
        assert!(matches!(
            ComparisonTable::from_rows(vec![one_sided]),
            Err(BuildError::UnpairedBound { .. })
        ));

        let inverted = ParameterEstimate::new("m", "a", 1.0).with_bounds(2.0, 1.0);
        assert!(matches!(
            ComparisonTable::from_rows(vec![inverted]),
            Err(BuildError::InvertedInterval { .. })
        ));

        let nan = ParameterEstimate::new("m", "a", 1.0).with_bounds(f64::NAN, 1.0);
        assert!(matches!(
            ComparisonTable::from_rows(vec![nan]),
            Err(BuildError::NonFinite { field: "ci_lower", .. })
        ));

        let degenerate = ParameterEstimate::new("m", "a", 1.0).with_bounds(1.0, 1.0);
        let table = ComparisonTable::from_rows(vec![degenerate]).unwrap();
        assert_eq!(table.rows()[0].std, Some(0.0));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            ComparisonTable::from_rows(vec![ParameterEstimate::new(" ", "a", 1.0)]),
            Err(BuildError::BlankName { row: 0, field: "model" })
        );
        assert_eq!(
            ComparisonTable::from_rows(vec![
                ParameterEstimate::new("m", "a", 1.0),
                ParameterEstimate::new("m", "", 1.0),
            ]),
            Err(BuildError::BlankName { row: 1, field: "param_name" })
        );
    }

    #[test]
    fn groups_default_and_keep_first_appearance_order() {
        let table = ComparisonTable::from_rows(vec![
            ParameterEstimate::new("m", "a", 1.0).with_group("slope"),
            ParameterEstimate::new("m", "b", 1.0),
            ParameterEstimate::new("m", "c", 1.0).with_group("slope").with_color("red"),
        ])
        .unwrap();
        assert_eq!(table.groups(), ["slope", DEFAULT_GROUP]);
        assert_eq!(table.color_tags(), ["red"]);
        assert_eq!(table.row(RowId(1)).unwrap().group_label(), DEFAULT_GROUP);
        assert!(table.row(RowId(3)).is_none());
    }
}
