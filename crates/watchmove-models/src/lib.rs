pub mod candidate;
pub mod import_payload;
pub mod media_ids;
pub mod resolved_movie;
pub mod skipped_record;
pub mod watch_record;

pub use candidate::{AmbiguityPolicy, Candidate};
pub use import_payload::{ImportPayload, PayloadLayout};
pub use media_ids::{ImdbId, InvalidImdbId};
pub use resolved_movie::ResolvedMovie;
pub use skipped_record::{SkipReason, SkippedRecord};
pub use watch_record::{WatchRecord, UNTITLED};
