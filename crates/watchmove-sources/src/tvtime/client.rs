use crate::error::SourceError;
use crate::http::{status_error, RetryPolicy};
use crate::traits::{IdLookupProvider, LookupQuery};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::OnceLock;
use tracing::debug;
use watchmove_models::{Candidate, ImdbId};

const BASE_URL: &str = "https://www.tvtime.com";

/// Reads the IMDb id embedded in a TV Time movie page
#[derive(Clone)]
pub struct TvTimeClient {
    client: Client,
    retry: RetryPolicy,
    base_url: String,
}

impl TvTimeClient {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn movie_url(&self, uuid: &str) -> String {
        format!("{}/movie/{}", self.base_url, urlencoding::encode(uuid))
    }
}

/// IMDb ids found in a movie page, in page order without repeats.
///
/// The id sits in an embedded JSON blob, sometimes with escaped quotes
/// (`\"imdb_id\":\"tt0081505\"`), sometimes plain (`imdb_id":"tt0081505"`).
pub fn extract_imdb_ids(page: &str) -> Vec<ImdbId> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#"\\"imdb_id\\":\\"(tt\d+)\\"|imdb_id":"(tt\d+)""#).expect("valid imdb_id pattern")
    });

    let mut ids: Vec<ImdbId> = Vec::new();
    for caps in pattern.captures_iter(page) {
        let raw = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        if let Some(id) = raw.and_then(|r| ImdbId::parse(r).ok()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

#[async_trait]
impl IdLookupProvider for TvTimeClient {
    fn lookup_provider_name(&self) -> &str {
        "tvtime"
    }

    fn lookup_priority(&self) -> u8 {
        90
    }

    fn is_exact(&self) -> bool {
        true
    }

    fn is_lookup_available(&self, query: &LookupQuery<'_>) -> bool {
        query.external_id.is_some_and(|id| !id.is_empty())
    }

    async fn lookup(&self, query: &LookupQuery<'_>) -> Result<Vec<Candidate>, SourceError> {
        let Some(uuid) = query.external_id else {
            return Ok(Vec::new());
        };
        let url = self.movie_url(uuid);

        let (status, page) = self
            .retry
            .get_text("TV Time page", || self.client.get(&url))
            .await?;

        if status == StatusCode::NOT_FOUND {
            debug!("TV Time has no movie page for uuid {}", uuid);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(status_error(status, &page));
        }

        let ids = extract_imdb_ids(&page);
        if ids.len() > 1 {
            debug!("TV Time page for {} lists {} IMDb ids, first one is the movie itself", uuid, ids.len());
        }

        Ok(ids.into_iter().map(Candidate::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{local_client, respond, serve};
    use std::time::Duration;

    fn instant_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_extract_imdb_ids_escaped_and_plain() {
        let escaped = r#"<script>self.__next_f.push([1,"{\"title\":\"The Shining\",\"imdb_id\":\"tt0081505\"}"])</script>"#;
        assert_eq!(extract_imdb_ids(escaped), vec![ImdbId::parse("tt0081505").unwrap()]);

        let plain = r#"{"movie":{"imdb_id":"tt0372784","name":"Batman Begins"}}"#;
        assert_eq!(extract_imdb_ids(plain), vec![ImdbId::parse("tt0372784").unwrap()]);
    }

    #[test]
    fn test_extract_imdb_ids_dedupes_in_page_order() {
        let page = r#"imdb_id":"tt2" ... imdb_id":"tt1" ... \"imdb_id\":\"tt2\""#;
        let ids: Vec<String> = extract_imdb_ids(page).into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["tt2", "tt1"]);
    }

    #[test]
    fn test_extract_imdb_ids_none() {
        assert!(extract_imdb_ids("<html>nothing here</html>").is_empty());
    }

    #[test]
    fn test_movie_url_and_availability() {
        let client = TvTimeClient::new(Client::new(), RetryPolicy::default())
            .with_base_url("http://localhost:9999/");
        assert_eq!(client.movie_url("a b"), "http://localhost:9999/movie/a%20b");

        let with_id = LookupQuery { title: "Heat", external_id: Some("123") };
        let without_id = LookupQuery { title: "Heat", external_id: None };
        assert!(client.is_lookup_available(&with_id));
        assert!(!client.is_lookup_available(&without_id));
    }

    #[tokio::test]
    async fn test_lookup_reads_movie_page() {
        let page = r#"<script>{"movie":{"imdb_id":"tt0081505"}}</script>"#;
        let server = serve(vec![respond(200, &[], page)]).await;
        let client = TvTimeClient::new(local_client(), instant_retry()).with_base_url(server.base_url());

        let query = LookupQuery { title: "The Shining", external_id: Some("u-shining") };
        let candidates = client.lookup(&query).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].imdb_id.as_str(), "tt0081505");
        let requests = server.requests().await;
        assert!(requests[0].starts_with("GET /movie/u-shining "));
    }

    #[tokio::test]
    async fn test_lookup_missing_page_is_not_an_error() {
        let server = serve(vec![respond(404, &[], "not found")]).await;
        let client = TvTimeClient::new(local_client(), instant_retry()).with_base_url(server.base_url());

        let query = LookupQuery { title: "Gone", external_id: Some("u-gone") };
        assert!(client.lookup(&query).await.unwrap().is_empty());
        assert_eq!(server.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_other_client_error_is_reported() {
        let server = serve(vec![respond(403, &[], "<html>blocked</html>")]).await;
        let client = TvTimeClient::new(local_client(), instant_retry()).with_base_url(server.base_url());

        let query = LookupQuery { title: "Heat", external_id: Some("u1") };
        let err = client.lookup(&query).await.unwrap_err();

        assert!(matches!(err, SourceError::Status { status: 403, ref body } if body.contains("blocked")));
        assert_eq!(server.requests().await.len(), 1);
    }
}
