use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::color::ColorMap;
use crate::compose::{compose, ComposeOptions, Composition};
use crate::data::filter::{filtered_rows, init_filter_state, FilterColumn, FilterState};
use crate::data::model::{ComparisonTable, RowId};
use crate::selection::{LinkMode, LinkingPolicy, SelectionState};

// ---------------------------------------------------------------------------
// View settings
// ---------------------------------------------------------------------------

/// User-adjustable presentation settings (seeded from the command line).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub title: String,
    /// Height of each group chart in points.
    pub chart_height: f32,
    pub compose: ComposeOptions,
    pub link: LinkMode,
    pub show_overview: bool,
    pub show_table: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            title: "Comparison Plot".to_string(),
            chart_height: 300.0,
            compose: ComposeOptions::default(),
            link: LinkMode::default(),
            show_overview: true,
            show_table: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until the user loads a file).
    pub table: Option<ComparisonTable>,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Rows passing the current filters (cached).
    pub visible_rows: Vec<RowId>,

    /// Colour tag resolution for the loaded table.
    pub color_map: ColorMap,

    /// Charts for the visible rows (cached).
    pub composition: Composition,

    /// Shared tap selection across every chart.
    pub selection: SelectionState,

    policy: Box<dyn LinkingPolicy>,

    pub settings: ViewSettings,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Where the current table was loaded from.
    pub source: Option<PathBuf>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewSettings::default())
    }
}

impl AppState {
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            table: None,
            filters: FilterState::default(),
            visible_rows: Vec::new(),
            color_map: ColorMap::new(&[]),
            composition: Composition::default(),
            selection: SelectionState::default(),
            policy: settings.link.policy(),
            settings,
            status_message: None,
            source: None,
        }
    }

    /// Load a file and make it the current table. On failure the previous
    /// table stays in place and the error is reported in the status line.
    pub fn load_path(&mut self, path: &Path) {
        match crate::data::loader::load_file(path) {
            Ok(table) => self.set_table(table, Some(path.to_path_buf())),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly built table: reset filters, colours and selection.
    pub fn set_table(&mut self, table: ComparisonTable, source: Option<PathBuf>) {
        self.filters = init_filter_state(&table);
        self.visible_rows = table.iter().map(|(id, _)| id).collect();
        self.color_map = ColorMap::new(table.color_tags());
        self.selection.clear();

        self.table = Some(table);
        self.source = source;
        self.status_message = None;
        self.recompose();
    }

    /// Recompute `visible_rows` and the charts after a filter change.
    pub fn refilter(&mut self) {
        if let Some(table) = &self.table {
            self.visible_rows = filtered_rows(table, &self.filters);
        }
        self.recompose();
    }

    /// Rebuild the charts from the visible rows and current settings.
    pub fn recompose(&mut self) {
        self.composition = match &self.table {
            Some(table) => compose(
                table,
                &self.visible_rows,
                &self.color_map,
                &self.settings.compose,
            ),
            None => Composition::default(),
        };
    }

    /// Apply a tap coming from any chart or the data table.
    pub fn tap(&mut self, target: Option<RowId>) {
        match &self.table {
            Some(table) => self.selection.tap(table, self.policy.as_ref(), target),
            None => self.selection.clear(),
        }
    }

    /// Swap the linking policy and re-apply it to the current selection.
    pub fn set_link_mode(&mut self, mode: LinkMode) {
        self.settings.link = mode;
        self.policy = mode.policy();
        if let crate::selection::Selection::Row(row) = self.selection.selection() {
            self.tap(Some(row));
        }
    }

    pub fn set_compose_options(&mut self, options: ComposeOptions) {
        if self.settings.compose != options {
            self.settings.compose = options;
            self.recompose();
        }
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: FilterColumn, value: &str) {
        let selected = self.filters.entry(column).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: FilterColumn) {
        if let Some(table) = &self.table {
            let all: BTreeSet<String> = column.values(table).iter().cloned().collect();
            self.filters.insert(column, all);
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: FilterColumn) {
        self.filters.insert(column, BTreeSet::new());
        self.refilter();
    }
}
