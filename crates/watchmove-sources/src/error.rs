use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited (HTTP 429)")]
    RateLimited { retry_after: Option<Duration> },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<SourceError> },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SourceError {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            SourceError::Status { status, .. } => *status >= 500,
            SourceError::RateLimited { .. } => true,
            SourceError::RetriesExhausted { .. } | SourceError::Decode(_) => false,
        }
    }

    /// Short label for grouping failures in summaries
    pub fn category(&self) -> &'static str {
        match self {
            SourceError::Http(_) => "network",
            SourceError::Status { .. } => "http status",
            SourceError::RateLimited { .. } => "rate limited",
            SourceError::RetriesExhausted { last, .. } => last.category(),
            SourceError::Decode(_) => "decode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SourceError::RateLimited { retry_after: None }.is_transient());
        assert!(SourceError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!SourceError::Status { status: 404, body: String::new() }.is_transient());
        assert!(!SourceError::Decode("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_exhausted_keeps_inner_category() {
        let err = SourceError::RetriesExhausted {
            attempts: 4,
            last: Box::new(SourceError::RateLimited { retry_after: None }),
        };
        assert!(!err.is_transient());
        assert_eq!(err.category(), "rate limited");
        assert!(err.to_string().contains("4 attempts"));
    }
}
