use crate::error::SourceError;
use crate::http::RetryPolicy;
use crate::traits::{IdLookupProvider, LookupQuery};
use crate::trakt::api;
use async_trait::async_trait;
use reqwest::Client;
use watchmove_models::Candidate;

/// Title search against the public Trakt API (needs only a client id, no OAuth)
#[derive(Clone)]
pub struct TraktClient {
    client: Client,
    retry: RetryPolicy,
    client_id: String,
    base_url: String,
}

impl TraktClient {
    pub fn new(client: Client, retry: RetryPolicy, client_id: String) -> Self {
        Self {
            client,
            retry,
            client_id,
            base_url: api::API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl IdLookupProvider for TraktClient {
    fn lookup_provider_name(&self) -> &str {
        "trakt"
    }

    fn lookup_priority(&self) -> u8 {
        80
    }

    fn is_lookup_available(&self, query: &LookupQuery<'_>) -> bool {
        !self.client_id.is_empty() && !query.title.trim().is_empty()
    }

    async fn lookup(&self, query: &LookupQuery<'_>) -> Result<Vec<Candidate>, SourceError> {
        api::search_movies(&self.client, &self.retry, &self.base_url, &self.client_id, query.title).await
    }
}
