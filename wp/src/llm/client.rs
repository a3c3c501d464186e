//! LlmClient trait and the HTTP plumbing its providers share

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmError};
use crate::config::LlmConfig;

/// Stateless LLM client - each call is independent (fresh context)
///
/// Every specialist step renders its whole input into one request, so no
/// conversation state is kept between calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Fallback wait when a 429 carries no usable `retry-after`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// One provider endpoint: model, credentials and an HTTP client with the
/// configured timeout
pub(crate) struct Endpoint {
    pub model: String,
    pub api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl Endpoint {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, model = %config.model, "Endpoint::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::NotConfigured(e.to_string()))?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// POST builder for a path under the base url
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(format!("{}{}", self.base_url, path))
    }

    /// Tokens to ask for: the request's wish, capped by config
    pub fn token_budget(&self, requested: u32) -> u32 {
        requested.min(self.max_tokens)
    }

    /// Send a request and decode a successful JSON body
    ///
    /// 429 becomes `RateLimited`, any other non-2xx becomes `ApiError` with
    /// the body text, and transport timeouts become `Timeout`.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, LlmError> {
        let response = request
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = retry_after(response.headers());
            debug!(?retry_after, model = %self.model, "Endpoint::send: rate limited");
            return Err(LlmError::RateLimited { retry_after });
        }
        if !status.is_success() {
            debug!(status = status.as_u16(), model = %self.model, "Endpoint::send: API error");
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Network(e)
        }
    }

    #[cfg(test)]
    pub fn for_tests(model: &str, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            http: Client::new(),
            max_tokens,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Wait requested by a rate-limited response, in whole seconds
fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}
