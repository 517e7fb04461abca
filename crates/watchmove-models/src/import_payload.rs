use crate::resolved_movie::ResolvedMovie;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything that ends up in the import file, in output order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportPayload {
    pub movies: Vec<ResolvedMovie>,
}

impl ImportPayload {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Number of watch events across all movies
    pub fn event_count(&self) -> usize {
        self.movies.iter().map(|m| m.watched_at.len()).sum()
    }
}

/// JSON shape of the import file
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadLayout {
    /// One entry per movie with a list of watch dates
    #[default]
    Grouped,
    /// One `{id, watched_at}` entry per watch event
    Flat,
    /// `{"movies": [...]}` body for Trakt's sync/history endpoint
    TraktSync,
}

impl fmt::Display for PayloadLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadLayout::Grouped => "grouped",
            PayloadLayout::Flat => "flat",
            PayloadLayout::TraktSync => "trakt-sync",
        };
        f.write_str(name)
    }
}
