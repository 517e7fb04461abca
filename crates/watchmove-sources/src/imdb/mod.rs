pub mod search;

pub use search::ImdbSearchClient;
