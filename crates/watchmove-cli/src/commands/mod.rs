pub mod config;
pub mod convert;
pub mod progress_ui;
