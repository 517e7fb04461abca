use crate::id_matching::{pick_candidate, MatchOutcome};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use watchmove_models::{AmbiguityPolicy, ImdbId};
use watchmove_sources::{IdLookupProvider, LookupQuery};

/// Outcome of resolving one movie against all providers
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        imdb_id: ImdbId,
        provider: String,
        /// Found by title search instead of the movie's own page
        fallback: bool,
    },
    Unresolved(UnresolvedReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedReason {
    NotFound,
    Ambiguous { candidates: Vec<ImdbId> },
    LookupFailed { errors: Vec<String> },
}

impl UnresolvedReason {
    pub fn category(&self) -> &'static str {
        match self {
            UnresolvedReason::NotFound => "not_found",
            UnresolvedReason::Ambiguous { .. } => "ambiguous",
            UnresolvedReason::LookupFailed { .. } => "lookup_failed",
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NotFound => f.write_str("no IMDb id found"),
            UnresolvedReason::Ambiguous { candidates } => {
                let ids: Vec<&str> = candidates.iter().map(|id| id.as_str()).collect();
                write!(f, "ambiguous title, candidates: {}", ids.join(", "))
            }
            UnresolvedReason::LookupFailed { errors } => write!(f, "lookup failed: {}", errors.join("; ")),
        }
    }
}

/// Runs a movie through the lookup providers, one at a time, highest priority first.
///
/// The first provider that yields a usable id wins. Provider errors are
/// collected and the next provider is tried; nothing here is fatal.
pub struct IdLookupService {
    providers: Vec<Box<dyn IdLookupProvider>>,
    policy: AmbiguityPolicy,
    request_delay: Duration,
    requests_made: usize,
}

impl IdLookupService {
    pub fn new(mut providers: Vec<Box<dyn IdLookupProvider>>, policy: AmbiguityPolicy) -> Self {
        providers.sort_by(|a, b| b.lookup_priority().cmp(&a.lookup_priority()));

        if providers.is_empty() {
            warn!("ID lookup service: no lookup providers enabled, every movie will be reported as unresolved");
        } else {
            debug!(
                "ID lookup service: {} provider(s) available: {:?}",
                providers.len(),
                providers.iter().map(|p| p.lookup_provider_name()).collect::<Vec<_>>()
            );
        }

        Self {
            providers,
            policy,
            request_delay: Duration::ZERO,
            requests_made: 0,
        }
    }

    /// Pause between consecutive provider requests
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.lookup_provider_name()).collect()
    }

    pub fn requests_made(&self) -> usize {
        self.requests_made
    }

    pub async fn resolve(&mut self, query: &LookupQuery<'_>) -> Resolution {
        let mut errors: Vec<String> = Vec::new();
        let mut ambiguous: Option<Vec<ImdbId>> = None;
        let mut consulted = 0;

        for provider in &self.providers {
            let name = provider.lookup_provider_name();
            if !provider.is_lookup_available(query) {
                tracing::trace!("ID lookup: provider '{}' not applicable for '{}'", name, query.title);
                continue;
            }

            if self.requests_made > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            self.requests_made += 1;
            consulted += 1;

            debug!(
                "ID lookup: asking {} for '{}' (uuid: {:?})",
                name, query.title, query.external_id
            );
            let candidates = match provider.lookup(query).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("ID lookup: {} failed for '{}': {}", name, query.title, e);
                    errors.push(format!("{}: {}", name, e));
                    continue;
                }
            };

            if provider.is_exact() {
                if let Some(first) = candidates.into_iter().next() {
                    return Resolution::Resolved {
                        imdb_id: first.imdb_id,
                        provider: name.to_string(),
                        fallback: false,
                    };
                }
                debug!("ID lookup: {} has no IMDb id for '{}'", name, query.title);
                continue;
            }

            match pick_candidate(query.title, &candidates, self.policy) {
                MatchOutcome::Match(candidate) => {
                    return Resolution::Resolved {
                        imdb_id: candidate.imdb_id,
                        provider: name.to_string(),
                        fallback: true,
                    };
                }
                MatchOutcome::NoMatch => {
                    debug!("ID lookup: {} found nothing for '{}'", name, query.title);
                }
                MatchOutcome::Ambiguous(ids) => {
                    debug!("ID lookup: {} returned {} candidates for '{}'", name, ids.len(), query.title);
                    ambiguous.get_or_insert(ids);
                }
            }
        }

        if consulted == 0 {
            debug!("ID lookup: no provider applies to '{}'", query.title);
        }

        let reason = match (ambiguous, errors.is_empty()) {
            (Some(candidates), _) => UnresolvedReason::Ambiguous { candidates },
            (None, false) => UnresolvedReason::LookupFailed { errors },
            (None, true) => UnresolvedReason::NotFound,
        };
        Resolution::Unresolved(reason)
    }
}
