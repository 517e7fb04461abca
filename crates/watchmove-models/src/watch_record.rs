use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for export rows that carry an external id but no title
pub const UNTITLED: &str = "(no title)";

/// One watch event read from the export CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchRecord {
    pub title: String,
    /// Source-service identifier for the movie (TV Time uuid)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub watched_at: DateTime<Utc>,
    /// 1-based data row in the CSV, header excluded
    pub row: usize,
}

impl WatchRecord {
    pub fn has_title(&self) -> bool {
        self.title != UNTITLED
    }

    /// Movie page on the source service, if the record carries an external id
    pub fn source_url(&self) -> Option<String> {
        self.external_id
            .as_deref()
            .map(|uuid| format!("https://www.tvtime.com/movie/{}", uuid))
    }
}
