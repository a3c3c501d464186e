//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors from building a client or asking a model
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Unknown LLM provider: '{0}'. Supported: anthropic, openai")]
    UnknownProvider(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether asking again could plausibly succeed
    ///
    /// Overload (529) and request timeout (408) count alongside 5xx.
    /// Configuration problems never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } | LlmError::Network(_) | LlmError::Timeout(_) => true,
            LlmError::ApiError { status, .. } => matches!(status, 408 | 429 | 529) || *status >= 500,
            LlmError::NotConfigured(_)
            | LlmError::UnknownProvider(_)
            | LlmError::InvalidResponse(_)
            | LlmError::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::ApiError {
            status,
            message: "upstream said no".to_string(),
        }
    }

    #[test]
    fn test_provider_pressure_is_retryable() {
        assert!(
            LlmError::RateLimited {
                retry_after: Duration::from_secs(60)
            }
            .is_retryable()
        );
        assert!(api(502).is_retryable());
        assert!(api(529).is_retryable());
        assert!(api(408).is_retryable());
        assert!(LlmError::Timeout(Duration::from_secs(30)).is_retryable());
    }

    #[test]
    fn test_bad_requests_and_setup_are_not_retryable() {
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(!LlmError::InvalidResponse("empty content".to_string()).is_retryable());
        assert!(!LlmError::NotConfigured("ANTHROPIC_API_KEY is not set".to_string()).is_retryable());
        assert!(!LlmError::UnknownProvider("carrier-pigeon".to_string()).is_retryable());
    }
}
