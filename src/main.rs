mod app;
mod cli;
mod color;
mod compose;
mod data;
mod error;
mod selection;
mod state;
mod ui;

use app::ComparisonPlotApp;
use clap::Parser;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let cli = cli::Cli::parse();
    let mut state = AppState::new(cli.view_settings());
    if let Some(path) = &cli.path {
        state.load_path(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        &cli.title,
        options,
        Box::new(|_cc| Ok(Box::new(ComparisonPlotApp::new(state)))),
    )
}
