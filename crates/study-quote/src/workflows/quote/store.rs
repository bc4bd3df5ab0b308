use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::domain::QuoteId;
use super::repository::{QuoteStore, SaveQuoteRequest, StoreError};

/// Bounded retry with exponential backoff and a per-attempt timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delays slept between consecutive attempts.
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        let mut schedule = Vec::new();
        let mut delay = self.initial_backoff;
        for _ in 1..self.max_attempts.max(1) {
            schedule.push(delay);
            delay = (delay * 2).min(self.max_backoff);
        }
        schedule
    }
}

/// Wraps another store with [`RetryPolicy`]. Rejections are returned immediately.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S> QuoteStore for RetryingStore<S>
where
    S: QuoteStore,
{
    async fn save(&self, request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        let schedule = self.policy.backoff_schedule();
        let max_attempts = schedule.len() + 1;
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout(self.policy.timeout, self.inner.save(request))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout),
            };

            match outcome {
                Ok(quote_id) => {
                    if attempt > 1 {
                        info!(%quote_id, attempt, "quote saved after retry");
                    }
                    return Ok(quote_id);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = schedule[attempt - 1];
                    warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        backoff_ms = delay.as_millis() as u64,
                        "quote save failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "quote save failed");
                    return Err(err);
                }
            }
        }
    }
}

/// `POST {endpoint}/quotes` against the external persistence service.
#[derive(Debug, Clone)]
pub struct HttpQuoteStore {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SavedQuoteBody {
    #[serde(alias = "quoteId")]
    id: String,
}

impl HttpQuoteStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn quotes_url(&self) -> String {
        format!("{}/quotes", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl QuoteStore for HttpQuoteStore {
    async fn save(&self, request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        let response = self
            .client
            .post(self.quotes_url())
            .json(request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    StoreError::Timeout
                } else {
                    StoreError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(StoreError::Server {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: SavedQuoteBody =
            response
                .json()
                .await
                .map_err(|err| StoreError::Rejected {
                    status: status.as_u16(),
                    message: format!("unreadable response body: {err}"),
                })?;

        Ok(QuoteId(body.id))
    }
}
