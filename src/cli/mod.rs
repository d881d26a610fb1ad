pub mod ui;
pub mod update;
