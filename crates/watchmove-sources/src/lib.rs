pub mod error;
pub mod http;
pub mod imdb;
pub mod traits;
pub mod trakt;
pub mod tvtime;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SourceError;
pub use http::{create_http_client, RetryPolicy};
pub use imdb::ImdbSearchClient;
pub use traits::{IdLookupProvider, LookupQuery};
pub use trakt::TraktClient;
pub use tvtime::{parse_tracking_csv, ParsedExport, TvTimeClient};
