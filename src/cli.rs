//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::compose::{ComposeOptions, ParamOrder};
use crate::selection::LinkMode;
use crate::state::ViewSettings;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "comparison-plot",
    version,
    about = "Compare parameter estimates and confidence intervals across models"
)]
pub struct Cli {
    /// Estimates to open on startup (.json, .csv or .parquet).
    pub path: Option<PathBuf>,

    /// Window and view title.
    #[arg(long, default_value = "Comparison Plot")]
    pub title: String,

    /// Height of each group chart (points).
    #[arg(long, default_value_t = 300.0)]
    pub chart_height: f32,

    /// What a tap on a point selects.
    #[arg(long, value_enum, default_value_t = LinkMode::Model)]
    pub link: LinkMode,

    /// Order of parameters along each chart's axis.
    #[arg(long, value_enum, default_value_t = ParamOrder::First)]
    pub param_order: ParamOrder,

    /// Draw every model on the parameter's centre line instead of offsetting them.
    #[arg(long)]
    pub no_dodge: bool,

    /// Hide the models × parameters overview.
    #[arg(long)]
    pub no_overview: bool,

    /// Show the flat data table below the charts.
    #[arg(long)]
    pub table: bool,
}

impl Cli {
    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            title: self.title.clone(),
            chart_height: self.chart_height,
            compose: ComposeOptions {
                param_order: self.param_order,
                dodge: !self.no_dodge,
            },
            link: self.link,
            show_overview: !self.no_overview,
            show_table: self.table,
        }
    }
}
