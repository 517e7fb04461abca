use crate::aggregate::{group_records, MovieAccumulator, MovieGroup};
use crate::id_cache::{CachedId, ResolutionCache};
use crate::id_lookup::{IdLookupService, Resolution, UnresolvedReason};
use crate::progress::ProgressTracker;
use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};
use watchmove_models::{ImdbId, ImportPayload, WatchRecord};
use watchmove_sources::LookupQuery;

/// Callback invoked after each movie: (current, total, title)
pub type ProgressCallback = Box<dyn FnMut(usize, usize, &str)>;

pub struct ConversionOptions {
    pub cache: Option<ResolutionCache>,
    /// Log a progress line every N movies
    pub progress_interval: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            cache: None,
            progress_interval: 25,
        }
    }
}

/// A movie whose id came from a title search; worth a manual look
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackEntry {
    pub title: String,
    pub imdb_id: ImdbId,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub imdb_url: String,
}

/// A movie left out of the import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub watch_events: usize,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionReport {
    pub events_read: usize,
    pub groups: usize,
    pub resolved: usize,
    pub cache_hits: usize,
    pub duplicate_events: usize,
    pub fallback: Vec<FallbackEntry>,
    pub unresolved: Vec<UnresolvedEntry>,
}

impl ConversionReport {
    /// Watch events that could not be placed under any movie id
    pub fn unresolved_events(&self) -> usize {
        self.unresolved.iter().map(|u| u.watch_events).sum()
    }
}

#[derive(Debug)]
pub struct ConversionResult {
    pub payload: ImportPayload,
    pub report: ConversionReport,
}

/// Groups watch records, resolves each movie once and merges the results
/// into an import payload
pub struct Converter {
    lookup: IdLookupService,
    cache: Option<ResolutionCache>,
    progress_interval: usize,
    on_progress: Option<ProgressCallback>,
}

impl Converter {
    pub fn new(lookup: IdLookupService, options: ConversionOptions) -> Self {
        Self {
            lookup,
            cache: options.cache,
            progress_interval: options.progress_interval,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn lookup_service(&self) -> &IdLookupService {
        &self.lookup
    }

    pub async fn run(&mut self, records: &[WatchRecord]) -> ConversionResult {
        let groups = group_records(records);
        let total = groups.len();
        info!("Converting {} watch events across {} movies", records.len(), total);

        let mut report = ConversionReport {
            events_read: records.len(),
            groups: total,
            ..Default::default()
        };
        let mut accumulator = MovieAccumulator::new();
        let mut tracker = ProgressTracker::new(total, self.progress_interval);

        for (index, group) in groups.into_iter().enumerate() {
            let title = group.title.clone();
            let key = group.key.to_string();

            if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&key)).cloned() {
                debug!("ID cache hit for {} -> {}", key, cached.imdb_id);
                tracker.record_cached();
                report.cache_hits += 1;
                if cached.fallback {
                    report.fallback.push(fallback_entry(&group, &cached.imdb_id, "cache"));
                }
                accumulator.add(group, cached.imdb_id, "cache", cached.fallback);
            } else {
                let query = LookupQuery {
                    title: group.search_title(),
                    external_id: group.external_id.as_deref(),
                };
                let resolution = self.lookup.resolve(&query).await;
                match resolution {
                    Resolution::Resolved { imdb_id, provider, fallback } => {
                        tracker.record_resolved(fallback);
                        if fallback {
                            report.fallback.push(fallback_entry(&group, &imdb_id, &provider));
                        }
                        if let Some(cache) = self.cache.as_mut() {
                            cache.insert(
                                key,
                                CachedId {
                                    imdb_id: imdb_id.clone(),
                                    title: group.title.clone(),
                                    resolved_by: provider.clone(),
                                    fallback,
                                },
                            );
                        }
                        accumulator.add(group, imdb_id, &provider, fallback);
                    }
                    Resolution::Unresolved(reason) => {
                        warn!("Skipping '{}' ({} watch events): {}", group.title, group.watched_at.len(), reason);
                        tracker.record_unresolved(reason.category());
                        report.unresolved.push(UnresolvedEntry {
                            source_url: group.source_url(),
                            title: group.title,
                            external_id: group.external_id,
                            watch_events: group.watched_at.len(),
                            reason,
                        });
                    }
                }
            }

            tracker.log_progress(index + 1);
            if let Some(callback) = self.on_progress.as_mut() {
                callback(index + 1, total, &title);
            }
        }

        tracker.log_summary("IMDb id lookup");

        report.duplicate_events = accumulator.duplicate_events();
        let movies = accumulator.into_movies();
        report.resolved = total - report.unresolved.len();
        if report.duplicate_events > 0 {
            info!("Collapsed {} repeated watch events", report.duplicate_events);
        }

        ConversionResult {
            payload: ImportPayload { movies },
            report,
        }
    }

    /// Persist the resolution cache, if one is configured and changed
    pub fn save_cache(&mut self) -> Result<bool> {
        match self.cache.as_mut() {
            Some(cache) => cache.save(),
            None => Ok(false),
        }
    }
}

fn fallback_entry(group: &MovieGroup, imdb_id: &ImdbId, provider: &str) -> FallbackEntry {
    FallbackEntry {
        title: group.title.clone(),
        imdb_id: imdb_id.clone(),
        provider: provider.to_string(),
        source_url: group.source_url(),
        imdb_url: imdb_id.imdb_url(),
    }
}

#[cfg(test)]
mod tests;
