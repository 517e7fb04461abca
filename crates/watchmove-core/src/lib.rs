pub mod aggregate;
pub mod export;
pub mod id_cache;
pub mod id_lookup;
pub mod id_matching;
pub mod pipeline;
pub mod progress;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{group_records, MovieAccumulator, MovieGroup, MovieKey};
pub use export::{format_watched_at, render_payload, write_payload, ExportError};
pub use id_cache::{CachedId, ResolutionCache};
pub use id_lookup::{IdLookupService, Resolution, UnresolvedReason};
pub use id_matching::{normalize_title, pick_candidate, MatchOutcome};
pub use pipeline::{
    ConversionOptions, ConversionReport, ConversionResult, Converter, FallbackEntry, ProgressCallback,
    UnresolvedEntry,
};
pub use progress::ProgressTracker;
