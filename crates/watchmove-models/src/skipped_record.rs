use serde::{Deserialize, Serialize};
use std::fmt;

/// A CSV row that was read but not turned into a [`crate::WatchRecord`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedRecord {
    pub row: usize,
    pub title: Option<String>,
    pub external_id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkipReason {
    /// Show or episode rows; only movies are converted
    NotAMovie { entity_type: String },
    /// Movie rows that track something other than a watch (e.g. a follow)
    NotWatched { kind: String },
    Malformed { detail: String },
}

impl SkipReason {
    pub fn category(&self) -> &'static str {
        match self {
            SkipReason::NotAMovie { .. } => "not a movie",
            SkipReason::NotWatched { .. } => "not watched",
            SkipReason::Malformed { .. } => "malformed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAMovie { entity_type } => write!(f, "not a movie (entity_type: {})", entity_type),
            SkipReason::NotWatched { kind } => write!(f, "not a watch event (type: {})", kind),
            SkipReason::Malformed { detail } => write!(f, "malformed row: {}", detail),
        }
    }
}
