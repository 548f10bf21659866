use super::model::{ComparisonTable, ModelEstimates, ParameterEstimate};
use crate::error::BuildError;

// ---------------------------------------------------------------------------
// Record builder: model → parameter table mapping into one flat table
// ---------------------------------------------------------------------------

/// Flatten per-model parameter tables into a single [`ComparisonTable`].
///
/// Rows are emitted model by model, each model's parameters in their own
/// order. Every row is stamped with its model and parameter name and gets the
/// derived `std` column; group and colour are left unset. Models with no
/// parameters contribute no rows.
pub fn build_table(estimates: &[ModelEstimates]) -> Result<ComparisonTable, BuildError> {
    if estimates.is_empty() {
        return Err(BuildError::EmptyInput);
    }

    let n_rows = estimates.iter().map(|m| m.params.len()).sum();
    let mut rows = Vec::with_capacity(n_rows);

    for model in estimates {
        for param in &model.params {
            let mut row = ParameterEstimate::new(&model.model, &param.name, param.value);
            if let Some(interval) = param.interval {
                row = row.with_bounds(interval.lower, interval.upper);
            }
            rows.push(row);
        }
    }

    let table = ComparisonTable::from_rows(rows)?;
    log::info!(
        "Built comparison table: {} rows from {} models",
        table.len(),
        estimates.len()
    );
    Ok(table)
}
