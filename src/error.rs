use thiserror::Error;

// ---------------------------------------------------------------------------
// Validation errors raised while building a comparison table
// ---------------------------------------------------------------------------

/// Why a set of estimates could not be turned into a [`ComparisonTable`].
///
/// Every variant aborts chart construction; nothing is drawn from a table
/// that failed to build.
///
/// [`ComparisonTable`]: crate::data::model::ComparisonTable
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("no estimates to compare: the input is empty")]
    EmptyInput,

    #[error("row {row}: {field} must not be blank")]
    BlankName { row: usize, field: &'static str },

    /// `table` names the per-model table, or the file for flat input.
    #[error("table '{table}': missing column '{column}'")]
    MissingColumn { table: String, column: &'static str },

    #[error("model '{model}', parameter '{param}': {field} is not a finite number")]
    NonFinite {
        model: String,
        param: String,
        field: &'static str,
    },

    #[error("model '{model}', parameter '{param}': only one confidence bound is present")]
    UnpairedBound { model: String, param: String },

    #[error(
        "model '{model}', parameter '{param}': lower bound {lower} is above upper bound {upper}"
    )]
    InvertedInterval {
        model: String,
        param: String,
        lower: f64,
        upper: f64,
    },

    #[error("model '{model}': parameter '{param}' appears more than once")]
    DuplicateParameter { model: String, param: String },
}
