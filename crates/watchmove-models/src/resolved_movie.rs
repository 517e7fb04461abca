use crate::media_ids::ImdbId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie with its canonical id and every distinct time it was watched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedMovie {
    pub title: String,
    pub imdb_id: ImdbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Sorted ascending, no two equal
    pub watched_at: Vec<DateTime<Utc>>,
    /// Name of the lookup provider that produced the id ("cache" for cached ids)
    pub resolved_by: String,
    /// True when the id came from a title search rather than the movie's own page
    pub fallback: bool,
}

impl ResolvedMovie {
    /// Add watch events, keeping `watched_at` sorted and free of repeats.
    ///
    /// Returns how many of the given events were already present.
    pub fn merge_watches<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut duplicates = 0;
        for event in events {
            match self.watched_at.binary_search(&event) {
                Ok(_) => duplicates += 1,
                Err(pos) => self.watched_at.insert(pos, event),
            }
        }
        duplicates
    }
}
