//! `egui` rendering: panels, charts and the flat data table.

pub mod panels;
pub mod plot;
pub mod table;
