//! Step failure taxonomy
//!
//! A specialist call either yields its typed output or a [`StepFailure`].
//! Whether a failure is retried, replaced by a placeholder or aborts the run
//! is decided by [`FailureKind::is_retryable`] and [`disposition`] alone.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::StepName;
use crate::llm::LlmError;

/// Classification of a failed step call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input or output; never retried
    Validation,
    /// Timeout or provider hiccup; retried
    Transient,
    /// Non-load-bearing step gave up; a placeholder takes its place
    Unavailable,
    /// Load-bearing step gave up; the run aborts
    Fatal,
}

impl FailureKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Transient => write!(f, "transient"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// A failed specialist call
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} failure: {message}")]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StepFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }

    pub fn timed_out(step: StepName, timeout_ms: u64) -> Self {
        Self::transient(format!("{} step timed out after {}ms", step, timeout_ms))
    }
}

impl From<LlmError> for StepFailure {
    fn from(err: LlmError) -> Self {
        if err.is_retryable() {
            Self::transient(err.to_string())
        } else {
            Self::validation(err.to_string())
        }
    }
}

/// What a failure that survived every retry means for the run
///
/// Load-bearing steps abort the run; every other step degrades to a
/// placeholder. The failure kind only governs retrying.
pub fn disposition(step: StepName, failure: &StepFailure) -> FailureKind {
    tracing::debug!(%step, kind = %failure.kind, "disposition: called");
    if step.is_load_bearing() {
        FailureKind::Fatal
    } else {
        FailureKind::Unavailable
    }
}
