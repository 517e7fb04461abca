use async_trait::async_trait;
use watchmove_models::Candidate;
use crate::error::SourceError;

/// What a provider is asked to identify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupQuery<'a> {
    pub title: &'a str,
    /// Source-service identifier (TV Time uuid), when the export had one
    pub external_id: Option<&'a str>,
}

/// A service that can turn a movie title (or external id) into IMDb ids
#[async_trait]
pub trait IdLookupProvider: Send + Sync {
    fn lookup_provider_name(&self) -> &str;

    /// Higher runs first
    fn lookup_priority(&self) -> u8;

    /// Exact providers look the movie up by its own identifier, so their
    /// answer is not a title match and is never reported as a fallback.
    fn is_exact(&self) -> bool {
        false
    }

    /// Whether this provider can do anything with the query at all
    fn is_lookup_available(&self, _query: &LookupQuery<'_>) -> bool {
        true
    }

    /// Candidates in the provider's own ranking order. An empty list means
    /// "not found"; errors are reserved for failed requests.
    async fn lookup(&self, query: &LookupQuery<'_>) -> Result<Vec<Candidate>, SourceError>;
}
