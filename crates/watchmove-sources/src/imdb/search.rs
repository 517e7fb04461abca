use crate::error::SourceError;
use crate::http::{status_error, RetryPolicy};
use crate::traits::{IdLookupProvider, LookupQuery};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;
use watchmove_models::{Candidate, ImdbId};

const BASE_URL: &str = "https://www.imdb.com";

/// Title search through the public IMDb find page (no API key)
#[derive(Clone)]
pub struct ImdbSearchClient {
    client: Client,
    retry: RetryPolicy,
    base_url: String,
}

impl ImdbSearchClient {
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

    pub fn search_url(&self, title: &str) -> String {
        format!("{}/find?q={}&s=tt", self.base_url, urlencoding::encode(title.trim()))
    }
}

fn title_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"href="/title/(tt\d+)/[^"]*"[^>]*>([^<]*)</a>"#).expect("valid title link pattern")
    })
}

fn title_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/title/(tt\d+)/").expect("valid title path pattern"))
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Result links of a find page, in page order, one candidate per title id.
///
/// Link text becomes the candidate title when the id has a text link anywhere
/// on the page; poster and image links only contribute the id.
pub fn extract_search_candidates(page: &str) -> Vec<Candidate> {
    let mut titles: HashMap<&str, String> = HashMap::new();
    for caps in title_link_pattern().captures_iter(page) {
        let (Some(id), Some(text)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let text = decode_entities(text.as_str().trim());
        if !text.is_empty() {
            titles.entry(id.as_str()).or_insert(text);
        }
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for caps in title_path_pattern().captures_iter(page) {
        let Some(raw) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Ok(id) = ImdbId::parse(raw) else {
            continue;
        };
        if candidates.iter().any(|c| c.imdb_id == id) {
            continue;
        }
        let candidate = match titles.get(raw) {
            Some(title) => Candidate::new(id).with_title(title.clone(), None),
            None => Candidate::new(id),
        };
        candidates.push(candidate);
    }
    candidates
}

#[async_trait]
impl IdLookupProvider for ImdbSearchClient {
    fn lookup_provider_name(&self) -> &str {
        "imdb"
    }

    fn lookup_priority(&self) -> u8 {
        50
    }

    fn is_lookup_available(&self, query: &LookupQuery<'_>) -> bool {
        !query.title.trim().is_empty()
    }

    async fn lookup(&self, query: &LookupQuery<'_>) -> Result<Vec<Candidate>, SourceError> {
        let url = self.search_url(query.title);

        let (status, page) = self
            .retry
            .get_text("IMDb search", || self.client.get(&url).header("Accept-Language", "en-US,en;q=0.9"))
            .await?;

        if !status.is_success() {
            return Err(status_error(status, &page));
        }

        let candidates = extract_search_candidates(&page);
        debug!("IMDb search for '{}': {} candidate(s)", query.title, candidates.len());
        Ok(candidates)
    }
}
