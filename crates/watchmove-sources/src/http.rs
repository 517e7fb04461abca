use crate::error::SourceError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Both lookup sites sit behind bot protection that rejects unknown agents (HTTP 403)
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAX_BODY_IN_ERROR: usize = 200;

/// Create a reqwest Client with browser-like headers and a per-request timeout
pub fn create_http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Bounded retry with exponential backoff for transient lookup failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): base * 2^(retry-1), capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// A server-provided Retry-After wins over the computed backoff, within the cap
    pub fn delay_for(&self, retry: u32, error: &SourceError) -> Duration {
        match error {
            SourceError::RateLimited { retry_after: Some(wait) } => (*wait).min(self.max_delay),
            _ => self.backoff(retry),
        }
    }

    /// Run `op` until it succeeds, fails permanently, or runs out of retries
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.delay_for(retries, &e);
                    warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        label, e, retries, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() && retries > 0 => {
                    return Err(SourceError::RetriesExhausted {
                        attempts: retries + 1,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// GET the request built by `build` and read its body, retrying on 429,
    /// 5xx and network errors (including a body read that times out).
    ///
    /// Any other status comes back with its body for the caller to judge.
    pub async fn get_text<B>(&self, label: &str, build: B) -> Result<(StatusCode, String), SourceError>
    where
        B: Fn() -> RequestBuilder,
    {
        self.run(label, || {
            let request = build();
            async move {
                let response = request.send().await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = retry_after(&response);
                    debug!("Rate limited by {} (retry-after: {:?})", response.url(), retry_after);
                    return Err(SourceError::RateLimited { retry_after });
                }
                let body = response.text().await?;
                if status.is_server_error() {
                    return Err(status_error(status, &body));
                }
                Ok((status, body))
            }
        })
        .await
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// `SourceError::Status` for a non-success response, keeping a short body excerpt
pub fn status_error(status: StatusCode, body: &str) -> SourceError {
    SourceError::Status {
        status: status.as_u16(),
        body: body.chars().take(MAX_BODY_IN_ERROR).collect(),
    }
}
