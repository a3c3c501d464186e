//! Event types for planning progress
//!
//! These events describe everything observable about a planning run:
//! - Run lifecycle (started, completed, failed)
//! - Phase boundaries
//! - Step attempts (started, retrying, succeeded, failed)

use serde::{Deserialize, Serialize};

use crate::orchestrator::Phase;
use crate::steps::{FailureKind, StepName};

/// Core event enum - the vocabulary of planning activity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlanEvent {
    // === Run Lifecycle ===
    /// A planning run has started
    RunStarted { run_id: String, destination: String },
    /// A planning run produced a plan
    RunCompleted {
        run_id: String,
        plan_id: String,
        /// Number of placeholder/degradation annotations in the plan
        annotations: usize,
    },
    /// A planning run aborted
    RunFailed {
        run_id: String,
        phase: Phase,
        message: String,
    },

    // === Phases ===
    PhaseStarted { run_id: String, phase: Phase },
    PhaseCompleted {
        run_id: String,
        phase: Phase,
        duration_ms: u64,
    },

    // === Steps ===
    StepStarted {
        run_id: String,
        step: StepName,
        attempt: u32,
    },
    StepRetrying {
        run_id: String,
        step: StepName,
        attempt: u32,
        reason: String,
    },
    StepSucceeded {
        run_id: String,
        step: StepName,
        attempt: u32,
        duration_ms: u64,
    },
    StepFailed {
        run_id: String,
        step: StepName,
        kind: FailureKind,
        message: String,
    },
    /// A section was replaced by an "unavailable" placeholder
    Placeholder { run_id: String, section: String, reason: String },
}

impl PlanEvent {
    /// Get the run ID for this event
    pub fn run_id(&self) -> &str {
        match self {
            PlanEvent::RunStarted { run_id, .. }
            | PlanEvent::RunCompleted { run_id, .. }
            | PlanEvent::RunFailed { run_id, .. }
            | PlanEvent::PhaseStarted { run_id, .. }
            | PlanEvent::PhaseCompleted { run_id, .. }
            | PlanEvent::StepStarted { run_id, .. }
            | PlanEvent::StepRetrying { run_id, .. }
            | PlanEvent::StepSucceeded { run_id, .. }
            | PlanEvent::StepFailed { run_id, .. }
            | PlanEvent::Placeholder { run_id, .. } => run_id,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            PlanEvent::RunStarted { .. } => "RunStarted",
            PlanEvent::RunCompleted { .. } => "RunCompleted",
            PlanEvent::RunFailed { .. } => "RunFailed",
            PlanEvent::PhaseStarted { .. } => "PhaseStarted",
            PlanEvent::PhaseCompleted { .. } => "PhaseCompleted",
            PlanEvent::StepStarted { .. } => "StepStarted",
            PlanEvent::StepRetrying { .. } => "StepRetrying",
            PlanEvent::StepSucceeded { .. } => "StepSucceeded",
            PlanEvent::StepFailed { .. } => "StepFailed",
            PlanEvent::Placeholder { .. } => "Placeholder",
        }
    }

    /// One-line human-readable description
    pub fn describe(&self) -> String {
        match self {
            PlanEvent::RunStarted { destination, .. } => format!("planning trip to {}", destination),
            PlanEvent::RunCompleted { plan_id, annotations, .. } => {
                format!("plan {} compiled ({} annotations)", plan_id, annotations)
            }
            PlanEvent::RunFailed { phase, message, .. } => format!("{} phase failed: {}", phase, message),
            PlanEvent::PhaseStarted { phase, .. } => format!("[{}/5] {} phase", phase.index(), phase),
            PlanEvent::PhaseCompleted { phase, duration_ms, .. } => {
                format!("{} phase done in {}ms", phase, duration_ms)
            }
            PlanEvent::StepStarted { step, attempt, .. } if *attempt > 1 => {
                format!("{} step (attempt {})", step, attempt)
            }
            PlanEvent::StepStarted { step, .. } => format!("{} step", step),
            PlanEvent::StepRetrying { step, reason, .. } => format!("{} step retrying: {}", step, reason),
            PlanEvent::StepSucceeded { step, duration_ms, .. } => format!("{} step ok ({}ms)", step, duration_ms),
            PlanEvent::StepFailed { step, kind, message, .. } => {
                format!("{} step failed ({}): {}", step, kind, message)
            }
            PlanEvent::Placeholder { section, reason, .. } => format!("{} unavailable: {}", section, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_tagging() {
        let event = PlanEvent::StepFailed {
            run_id: "run-1".to_string(),
            step: StepName::Logistics,
            kind: FailureKind::Transient,
            message: "timed out".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StepFailed");
        assert_eq!(json["step"], "logistics");
        assert_eq!(json["kind"], "transient");

        let back: PlanEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_describe() {
        let event = PlanEvent::PhaseStarted {
            run_id: "run-1".to_string(),
            phase: Phase::Options,
        };
        assert_eq!(event.describe(), "[2/5] options phase");
        assert_eq!(event.run_id(), "run-1");
    }
}
