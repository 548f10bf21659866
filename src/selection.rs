//! Cross-chart selection linking.
//!
//! Tapping a mark selects its row; a [`LinkingPolicy`] decides which rows of
//! the table light up as a result. Every chart reads the same
//! [`SelectionState`], so a tap in one group chart is mirrored in all others.

use std::collections::BTreeSet;

use clap::ValueEnum;

use crate::data::model::{ComparisonTable, RowId};

// ---------------------------------------------------------------------------
// Linking policies
// ---------------------------------------------------------------------------

/// Decides which rows are highlighted when a row is selected.
pub trait LinkingPolicy {
    fn on_select(&self, table: &ComparisonTable, selected: RowId) -> BTreeSet<RowId>;
}

/// Highlight every row that shares the selected row's model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameModel;

impl LinkingPolicy for SameModel {
    fn on_select(&self, table: &ComparisonTable, selected: RowId) -> BTreeSet<RowId> {
        let Some(model) = table.row(selected).map(|r| r.model.as_str()) else {
            return BTreeSet::new();
        };
        table
            .iter()
            .filter(|(_, row)| row.model == model)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Highlight only the tapped row.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleRow;

impl LinkingPolicy for SingleRow {
    fn on_select(&self, table: &ComparisonTable, selected: RowId) -> BTreeSet<RowId> {
        table.row(selected).map(|_| selected).into_iter().collect()
    }
}

/// Policy choice exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LinkMode {
    /// Selecting a point highlights the same model in every chart.
    #[default]
    Model,
    /// Selecting a point highlights only that point.
    Row,
}

impl LinkMode {
    pub fn policy(self) -> Box<dyn LinkingPolicy> {
        match self {
            LinkMode::Model => Box::new(SameModel),
            LinkMode::Row => Box::new(SingleRow),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Row(RowId),
}

/// How a mark should be drawn given the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// Nothing is selected.
    Normal,
    Highlighted,
    Faded,
}

/// Current selection plus the rows the policy linked to it.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selection: Selection,
    highlighted: BTreeSet<RowId>,
}

impl SelectionState {
    /// Apply a tap: `Some(row)` selects it, `None` (empty space) clears.
    pub fn tap(
        &mut self,
        table: &ComparisonTable,
        policy: &dyn LinkingPolicy,
        target: Option<RowId>,
    ) {
        match target {
            Some(row) if table.row(row).is_some() => {
                self.highlighted = policy.on_select(table, row);
                self.selection = Selection::Row(row);
                log::debug!(
                    "Selected row {row}; {} rows highlighted",
                    self.highlighted.len()
                );
            }
            _ => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        if self.selection != Selection::None {
            log::debug!("Selection cleared");
        }
        self.selection = Selection::None;
        self.highlighted.clear();
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn highlighted(&self) -> &BTreeSet<RowId> {
        &self.highlighted
    }

    pub fn emphasis(&self, row: RowId) -> Emphasis {
        match self.selection {
            Selection::None => Emphasis::Normal,
            Selection::Row(_) if self.highlighted.contains(&row) => Emphasis::Highlighted,
            Selection::Row(_) => Emphasis::Faded,
        }
    }
}
