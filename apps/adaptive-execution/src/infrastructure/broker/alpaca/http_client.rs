//! HTTP client wrapper with retry logic.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::api_types::AlpacaErrorResponse;
use super::config::{AlpacaConfig, RetryConfig};
use super::error::AlpacaError;
use crate::application::ports::mentions_insufficient_funds;

/// Which Alpaca REST API a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlpacaApi {
    /// Orders, positions, assets.
    Trading,
    /// Quotes and trades.
    Data,
}

/// HTTP client for Alpaca APIs with retry logic.
#[derive(Debug, Clone)]
pub struct AlpacaHttpClient {
    client: Client,
    api_key: String,
    api_secret: String,
    trading_base_url: String,
    data_base_url: String,
    retry_config: RetryConfig,
}

impl AlpacaHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &AlpacaConfig) -> Result<Self, AlpacaError> {
        if !config.has_credentials() {
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
            trading_base_url: config.trading_base_url().trim_end_matches('/').to_string(),
            data_base_url: config.data_base_url().trim_end_matches('/').to_string(),
            retry_config: config.retry.clone(),
        })
    }

    /// GET from the trading API.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AlpacaError> {
        self.request(Method::GET, AlpacaApi::Trading, path, None::<&()>)
            .await
    }

    /// POST a JSON body to the trading API.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AlpacaError> {
        self.request(Method::POST, AlpacaApi::Trading, path, Some(body))
            .await
    }

    /// DELETE on the trading API, discarding any body.
    pub async fn delete(&self, path: &str) -> Result<(), AlpacaError> {
        let _: serde_json::Value = self
            .request(Method::DELETE, AlpacaApi::Trading, path, None::<&()>)
            .await?;
        Ok(())
    }

    /// GET from the market data API.
    pub async fn data_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AlpacaError> {
        self.request(Method::GET, AlpacaApi::Data, path, None::<&()>)
            .await
    }

    fn base_url(&self, api: AlpacaApi) -> &str {
        match api {
            AlpacaApi::Trading => &self.trading_base_url,
            AlpacaApi::Data => &self.data_base_url,
        }
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// A `Retry-After` header from a rate-limited response replaces the
    /// computed delay.
    async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        api: AlpacaApi,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, AlpacaError> {
        let url = format!("{}{path}", self.base_url(api));
        let mut backoff = ExponentialBackoff::new(&self.retry_config);

        loop {
            let (error, retry_after) = match self.send_once(&method, &url, path, body).await {
                Ok(value) => return Ok(value),
                Err(Failure::Fatal(error)) => return Err(error),
                Err(Failure::Transient { error, retry_after }) => (error, retry_after),
            };

            let Some(delay) = backoff.next_backoff() else {
                return Err(match error {
                    AlpacaError::RateLimited { .. } => error,
                    _ => AlpacaError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    },
                });
            };
            let delay = retry_after.unwrap_or(delay);

            tracing::warn!(
                method = %method,
                path,
                error = %error,
                attempt = backoff.attempt,
                delay_ms = delay.as_millis() as u64,
                "Alpaca request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One HTTP exchange, classified for the retry loop.
    async fn send_once<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: &Method,
        url: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, Failure> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret);
        if let Some(b) = body {
            request = request.json(b);
        }

        let response = request.send().await.map_err(|e| Failure::Transient {
            error: AlpacaError::Network(e.to_string()),
            retry_after: None,
        })?;
        let status = response.status();

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| Failure::Fatal(AlpacaError::Network(e.to_string())))?;
            // DELETE and some cancels answer 204 with no body
            let text = if text.trim().is_empty() { "null" } else { &text };
            return serde_json::from_str(text)
                .map_err(|e| Failure::Fatal(AlpacaError::JsonParse(e.to_string())));
        }

        let retry_after_secs = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let (code, message) = error_details(status, response.text().await.unwrap_or_default());

        Err(match categorize_status(status) {
            ErrorCategory::RateLimited => Failure::Transient {
                error: AlpacaError::RateLimited {
                    retry_after_secs: retry_after_secs.unwrap_or(60),
                },
                retry_after: retry_after_secs.map(Duration::from_secs),
            },
            ErrorCategory::Retryable => Failure::Transient {
                error: AlpacaError::Api { code, message },
                retry_after: None,
            },
            ErrorCategory::NonRetryable => {
                Failure::Fatal(classify_failure(status, path, code, message))
            }
        })
    }
}

/// Why a single exchange produced no value.
enum Failure {
    /// Worth another attempt; `retry_after` is the server's requested delay.
    Transient {
        error: AlpacaError,
        retry_after: Option<Duration>,
    },
    /// Surface immediately.
    Fatal(AlpacaError),
}

/// Error code and message from an error body, falling back to the status
/// code and raw text when the body is not Alpaca's JSON shape.
fn error_details(status: StatusCode, body: String) -> (String, String) {
    match serde_json::from_str::<AlpacaErrorResponse>(&body) {
        Ok(err) => (
            err.code_string().unwrap_or_else(|| status.as_u16().to_string()),
            err.message,
        ),
        Err(_) => (status.as_u16().to_string(), body),
    }
}

/// Map a non-retryable response to an adapter error.
fn classify_failure(status: StatusCode, path: &str, code: String, message: String) -> AlpacaError {
    if mentions_insufficient_funds(&message) {
        return AlpacaError::InsufficientBuyingPower(message);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AlpacaError::AuthenticationFailed,
        StatusCode::NOT_FOUND => AlpacaError::NotFound {
            resource: path.to_string(),
        },
        StatusCode::UNPROCESSABLE_ENTITY => AlpacaError::OrderRejected(message),
        _ => AlpacaError::Api { code, message },
    }
}

/// Error category for determining retry behavior.
enum ErrorCategory {
    RateLimited,
    Retryable,
    NonRetryable,
}

/// Categorize HTTP status code for retry handling.
const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        429 => ErrorCategory::RateLimited,
        408 | 500 | 502 | 503 | 504 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
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
