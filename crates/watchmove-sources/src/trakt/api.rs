use crate::error::SourceError;
use crate::http::{status_error, RetryPolicy};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use watchmove_models::{Candidate, ImdbId};

pub const API_URL: &str = "https://api.trakt.tv";

#[derive(Debug, Clone, Deserialize)]
pub struct TraktIds {
    pub imdb: Option<String>,
    pub trakt: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TraktMovie {
    title: String,
    year: Option<u32>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct TraktSearchResult {
    #[serde(rename = "type")]
    item_type: String,
    movie: Option<TraktMovie>,
}

/// Normalize title for Trakt API search
/// Removes commas and normalizes whitespace to improve search matching
pub fn normalize_title_for_search(title: &str) -> String {
    title
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn search_url(base_url: &str, title: &str) -> String {
    format!(
        "{}/search/movie?query={}&fields=title",
        base_url,
        urlencoding::encode(&normalize_title_for_search(title))
    )
}

/// Convert a `/search/movie` response body into candidates, best match first.
///
/// Results without an IMDb id cannot be imported and are dropped.
pub fn parse_search_results(body: &str) -> Result<Vec<Candidate>, SourceError> {
    let items: Vec<TraktSearchResult> =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(format!("Trakt search response: {}", e)))?;

    let candidates = items
        .into_iter()
        .filter(|item| item.item_type == "movie")
        .filter_map(|item| item.movie)
        .filter_map(|movie| {
            let imdb = movie.ids.imdb.as_deref().and_then(|raw| ImdbId::parse(raw).ok());
            if imdb.is_none() {
                debug!("Trakt search: dropping '{}' (trakt={:?}) without IMDb id", movie.title, movie.ids.trakt);
            }
            imdb.map(|id| Candidate::new(id).with_title(movie.title, movie.year))
        })
        .collect();

    Ok(candidates)
}

/// Search Trakt movies by title
/// Reference: https://trakt.docs.apiary.io/#reference/search/text-query/get-text-query-results
pub async fn search_movies(
    client: &Client,
    retry: &RetryPolicy,
    base_url: &str,
    client_id: &str,
    title: &str,
) -> Result<Vec<Candidate>, SourceError> {
    let url = search_url(base_url, title);

    let (status, body) = retry
        .get_text("Trakt search", || {
            client
                .get(&url)
                .header("trakt-api-version", "2")
                .header("trakt-api-key", client_id)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
        })
        .await?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }

    let candidates = parse_search_results(&body)?;
    debug!("Trakt search for '{}': {} candidate(s)", title, candidates.len());
    Ok(candidates)
}
