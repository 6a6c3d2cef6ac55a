//! HTTP client wrapper with bounded retry for idempotent calls.
//!
//! Two request paths exist on purpose:
//!
//! - `get` / `data_get` / `delete`: idempotent, retried with bounded
//!   exponential backoff on transient failures and rate limits.
//! - `post_once`: dispatched exactly once. Order submission must never
//!   be retried at this layer; a retry after an ambiguous failure could
//!   create a duplicate live order. That risk is handled above, by the
//!   idempotency mechanism.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::api_types::AlpacaErrorResponse;
use super::config::{AlpacaConfig, RetryConfig};
use super::error::AlpacaError;

/// HTTP client for the Alpaca API.
#[derive(Debug, Clone)]
pub struct AlpacaHttpClient {
    client: Client,
    api_key: String,
    api_secret: String,
    trading_base_url: String,
    data_base_url: String,
    retry: RetryConfig,
}

impl AlpacaHttpClient {
    /// Create a new HTTP client from config.
    ///
    /// # Errors
    ///
    /// Returns error when credentials are missing or the underlying
    /// client cannot be built.
    pub fn new(config: &AlpacaConfig) -> Result<Self, AlpacaError> {
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(AlpacaError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AlpacaError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            trading_base_url: config.trading_base_url().to_string(),
            data_base_url: config.data_base_url().to_string(),
            retry: config.retry.clone(),
        })
    }

    /// GET from the trading API, with retry.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AlpacaError> {
        self.request_with_retry(Method::GET, &self.trading_base_url, path, None::<&()>)
            .await
    }

    /// GET from the market data API, with retry.
    pub async fn data_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AlpacaError> {
        self.request_with_retry(Method::GET, &self.data_base_url, path, None::<&()>)
            .await
    }

    /// DELETE on the trading API, with retry.
    ///
    /// Cancellation is idempotent at the broker, so retrying is safe.
    pub async fn delete(&self, path: &str) -> Result<(), AlpacaError> {
        let _: serde_json::Value = self
            .request_with_retry(Method::DELETE, &self.trading_base_url, path, None::<&()>)
            .await?;
        Ok(())
    }

    /// POST to the trading API, exactly once. Never retried.
    pub async fn post_once<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AlpacaError> {
        self.attempt(Method::POST, &self.trading_base_url, path, Some(body))
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        base_url: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, AlpacaError> {
        let mut backoff = ExponentialBackoff::new(&self.retry);

        loop {
            let error = match self.attempt(method.clone(), base_url, path, body).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let delay = match &error {
                // Prefer the broker's own Retry-After hint when present.
                AlpacaError::RateLimited {
                    retry_after_secs: Some(secs),
                } => backoff.next_backoff().map(|_| Duration::from_secs(*secs)),
                AlpacaError::RateLimited { .. }
                | AlpacaError::Network(_)
                | AlpacaError::Server { .. } => backoff.next_backoff(),
                // Everything else is definitive; retrying cannot help.
                _ => return Err(error),
            };

            match delay {
                Some(delay) => {
                    tracing::warn!(
                        %error,
                        delay_ms = delay.as_millis(),
                        attempt = backoff.attempt,
                        path,
                        "Transient broker error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(AlpacaError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                        last_error: error.to_string(),
                    });
                }
            }
        }
    }

    /// One request attempt, with status-to-error mapping.
    async fn attempt<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        base_url: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, AlpacaError> {
        let url = format!("{base_url}{path}");
        let mut request = self
            .client
            .request(method, &url)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AlpacaError::Network(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| AlpacaError::Network(e.to_string()))?;
            let payload = if text.is_empty() { "null" } else { text.as_str() };
            return serde_json::from_str(payload).map_err(|e| AlpacaError::JsonParse(e.to_string()));
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let error_body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<AlpacaErrorResponse>(&error_body) {
            Ok(parsed) => (parsed.code, parsed.message),
            Err(_) => (None, error_body),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => AlpacaError::AuthenticationFailed,
            // 403 carries business rejections (e.g. insufficient buying
            // power) when a code is present; bad credentials otherwise.
            StatusCode::FORBIDDEN => match code {
                Some(code) => AlpacaError::Api {
                    code: code.to_string(),
                    message,
                },
                None => AlpacaError::AuthenticationFailed,
            },
            StatusCode::NOT_FOUND => AlpacaError::NotFound {
                what: path.to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS => AlpacaError::RateLimited {
                retry_after_secs: retry_after,
            },
            s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => AlpacaError::Server {
                status: s.as_u16(),
                message,
            },
            s => AlpacaError::Api {
                code: code.map_or_else(|| s.as_u16().to_string(), |c| c.to_string()),
                message,
            },
        })
    }
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(backoff)
    }
}
