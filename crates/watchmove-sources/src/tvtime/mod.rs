pub mod client;
pub mod parser;

pub use client::TvTimeClient;
pub use parser::{parse_tracking_csv, ParsedExport};
