//! Planning run errors

use thiserror::Error;

use super::Phase;
use crate::budget::CompileError;
use crate::steps::{StepFailure, StepName};

/// Why a planning run produced no plan
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// The request handed to the orchestrator breaks the completeness invariant
    #[error("planning could not be completed: invalid request: {0}")]
    InvalidRequest(String),

    /// A load-bearing step gave up
    #[error("planning could not be completed: {phase} phase failed ({step} step: {failure})")]
    StepFailed {
        phase: Phase,
        step: StepName,
        failure: StepFailure,
    },

    #[error("planning could not be completed: {phase} phase failed: {source}")]
    Compile {
        phase: Phase,
        #[source]
        source: CompileError,
    },
}

impl PlanningError {
    /// The phase that failed, if the run got that far
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::InvalidRequest(_) => None,
            Self::StepFailed { phase, .. } | Self::Compile { phase, .. } => Some(*phase),
        }
    }

    pub fn step(&self) -> Option<StepName> {
        match self {
            Self::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}
