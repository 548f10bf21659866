use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::model::{ComparisonTable, ParameterEstimate, RowId};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per filterable column
// ---------------------------------------------------------------------------

/// Columns the side panel can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterColumn {
    Model,
    Group,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 2] = [FilterColumn::Model, FilterColumn::Group];

    /// The row's value for this column (group falls back to the default label).
    pub fn value_of<'a>(&self, row: &'a ParameterEstimate) -> &'a str {
        match self {
            FilterColumn::Model => &row.model,
            FilterColumn::Group => row.group_label(),
        }
    }

    /// Distinct values of this column, in first-appearance order.
    pub fn values<'a>(&self, table: &'a ComparisonTable) -> &'a [String] {
        match self {
            FilterColumn::Model => table.models(),
            FilterColumn::Group => table.groups(),
        }
    }
}

impl fmt::Display for FilterColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterColumn::Model => write!(f, "model"),
            FilterColumn::Group => write!(f, "group"),
        }
    }
}

/// Per-column selection state: column → set of selected values.
/// An absent column means "no filter"; an empty set hides every row.
pub type FilterState = BTreeMap<FilterColumn, BTreeSet<String>>;

/// Initialise a [`FilterState`] with every value selected.
pub fn init_filter_state(table: &ComparisonTable) -> FilterState {
    FilterColumn::ALL
        .iter()
        .map(|col| (*col, col.values(table).iter().cloned().collect()))
        .collect()
}

/// Return ids of rows that pass all active filters, in table order.
pub fn filtered_rows(table: &ComparisonTable, filters: &FilterState) -> Vec<RowId> {
    table
        .iter()
        .filter(|(_, row)| {
            filters
                .iter()
                .all(|(col, selected)| selected.contains(col.value_of(row)))
        })
        .map(|(id, _)| id)
        .collect()
}
