//! HTTP client for product-page fetching with rate limiting and typed
//! failure classification.
//!
//! One client instance is shared by all outbound fetches so the rate
//! limiter actually bounds the crate's footprint on target sites.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Fetch layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "shopscout/0.1 (product research)".to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 4,
            follow_redirects: true,
        }
    }
}

/// Transport-level failures, pre-classified for the extraction stage.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The target refused service (HTTP 403 or 429).
    #[error("request refused with status {status}")]
    Blocked { status: u16 },

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Any other non-success status.
    #[error("request failed with status {status}")]
    Status { status: u16 },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("request cancelled")]
    Cancelled,
}

/// Rate-limited HTTP client for outbound page fetches.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    /// Fails on an unusable user agent or a zero rate limit.
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    /// Fetches `url` and returns the response body as text.
    ///
    /// Waits on the rate limiter first; both the wait and the request abort
    /// promptly when `cancel` fires.
    ///
    /// # Errors
    /// 403/429 map to [`FetchError::Blocked`], elapsed request deadlines to
    /// [`FetchError::Timeout`]; everything else is a status or transport
    /// failure.
    pub async fn get_text(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        tokio::select! {
            _ = self.rate_limiter.until_ready() => {}
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
        }

        tracing::debug!(url, "fetching page");

        let response = tokio::select! {
            result = self.client.get(url).send() => result.map_err(|e| self.classify(e))?,
            () = cancel.cancelled() => {
                tracing::warn!(url, "fetch cancelled mid-request");
                return Err(FetchError::Cancelled);
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(FetchError::Blocked {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let text = tokio::select! {
            result = response.text() => result.map_err(|e| self.classify(e))?,
            () = cancel.cancelled() => {
                tracing::warn!(url, "fetch cancelled while reading body");
                return Err(FetchError::Cancelled);
            }
        };

        tracing::debug!(url, bytes = text.len(), "fetched page");
        Ok(text)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                timeout_secs: self.config.timeout_seconds,
            }
        } else {
            FetchError::Transport {
                message: err.to_string(),
            }
        }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_creation_succeeds_with_defaults() {
        let client = HttpClient::new(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn zero_rate_limit_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_second: 0,
            ..Default::default()
        };
        assert!(HttpClient::new(config).is_err());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.get_text("https://shop.example/item", &cancel).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
