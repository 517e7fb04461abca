use crate::media_ids::ImdbId;
use serde::{Deserialize, Serialize};

/// A single hit returned by a lookup provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub imdb_id: ImdbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

impl Candidate {
    pub fn new(imdb_id: ImdbId) -> Self {
        Self { imdb_id, title: None, year: None }
    }

    pub fn with_title(mut self, title: impl Into<String>, year: Option<u32>) -> Self {
        self.title = Some(title.into());
        self.year = year;
        self
    }
}

/// What to do when a title search returns several plausible movies
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Leave the movie out of the import and report it
    #[default]
    Skip,
    /// Take the first hit, as listed by the provider
    First,
}

impl std::fmt::Display for AmbiguityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmbiguityPolicy::Skip => f.write_str("skip"),
            AmbiguityPolicy::First => f.write_str("first"),
        }
    }
}
