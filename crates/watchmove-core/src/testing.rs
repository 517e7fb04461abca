// In-memory lookup providers for tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use watchmove_models::{Candidate, ImdbId};
use watchmove_sources::{IdLookupProvider, LookupQuery, SourceError};

#[derive(Clone)]
pub enum FakeAnswer {
    Hits(Vec<Candidate>),
    Fail(u16),
}

/// Answers keyed by uuid (exact providers) or by title (search providers)
pub struct FakeProvider {
    name: String,
    priority: u8,
    exact: bool,
    answers: HashMap<String, FakeAnswer>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeProvider {
    pub fn exact(name: &str, priority: u8) -> Self {
        Self::new(name, priority, true)
    }

    pub fn search(name: &str, priority: u8) -> Self {
        Self::new(name, priority, false)
    }

    fn new(name: &str, priority: u8, exact: bool) -> Self {
        Self {
            name: name.to_string(),
            priority,
            exact,
            answers: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// One hit per id, each titled `title`
    pub fn with_hits(mut self, key: &str, title: &str, ids: &[&str]) -> Self {
        let hits = ids
            .iter()
            .map(|id| Candidate::new(ImdbId::parse(id).unwrap()).with_title(title, None))
            .collect();
        self.answers.insert(key.to_string(), FakeAnswer::Hits(hits));
        self
    }

    pub fn with_candidates(mut self, key: &str, candidates: Vec<Candidate>) -> Self {
        self.answers.insert(key.to_string(), FakeAnswer::Hits(candidates));
        self
    }

    pub fn with_failure(mut self, key: &str, status: u16) -> Self {
        self.answers.insert(key.to_string(), FakeAnswer::Fail(status));
        self
    }

    /// Shared log of the keys this provider was asked about
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    pub fn boxed(self) -> Box<dyn IdLookupProvider> {
        Box::new(self)
    }

    fn key_for(&self, query: &LookupQuery<'_>) -> String {
        if self.exact {
            query.external_id.unwrap_or_default().to_string()
        } else {
            query.title.to_string()
        }
    }
}

#[async_trait]
impl IdLookupProvider for FakeProvider {
    fn lookup_provider_name(&self) -> &str {
        &self.name
    }

    fn lookup_priority(&self) -> u8 {
        self.priority
    }

    fn is_exact(&self) -> bool {
        self.exact
    }

    fn is_lookup_available(&self, query: &LookupQuery<'_>) -> bool {
        !self.key_for(query).is_empty()
    }

    async fn lookup(&self, query: &LookupQuery<'_>) -> Result<Vec<Candidate>, SourceError> {
        let key = self.key_for(query);
        self.calls.lock().unwrap().push(key.clone());
        match self.answers.get(&key) {
            Some(FakeAnswer::Hits(hits)) => Ok(hits.clone()),
            Some(FakeAnswer::Fail(status)) => Err(SourceError::Status {
                status: *status,
                body: String::new(),
            }),
            None => Ok(Vec::new()),
        }
    }
}
