//! Rate-limited HTTP client for the EDGAR hosts.

use filings_core::{DataError, EdgarConfig, Endpoints, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    const fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// HTTP client for the EDGAR hosts.
///
/// Every request carries the configured contact identity as `User-Agent`,
/// waits for the shared rate limiter and is bounded by the configured timeout.
/// Clones share one rate limiter.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    config: Arc<EdgarConfig>,
}

impl EdgarClient {
    /// Create a new client from a configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: EdgarConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(config.identity.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.min_request_interval))),
            config: Arc::new(config),
        })
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &EdgarConfig {
        &self.config
    }

    /// Returns the registry endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.config.endpoints
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        self.rate_limiter.lock().await.wait().await;

        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Fetches a URL and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| DataError::Parse(format!("Failed to parse JSON from {}: {}", url, e)))
    }

    /// Fetches a URL and returns the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.send(url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;
        trace!(url = %url, bytes = body.len(), "Received body");
        Ok(body)
    }
}
