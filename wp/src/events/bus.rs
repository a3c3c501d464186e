//! Event Bus - pub/sub for planning progress
//!
//! Events travel over a tokio broadcast channel. Only run-bound
//! [`EventEmitter`]s publish, so every event carries the id of the run that
//! produced it; the CLI progress printer subscribes.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::PlanEvent;
use crate::orchestrator::Phase;
use crate::steps::{FailureKind, StepName};

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Central event bus for planning activity
pub struct EventBus {
    tx: broadcast::Sender<PlanEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlanEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter handle bound to one planning run
    pub fn emitter_for(&self, run_id: impl Into<String>) -> EventEmitter {
        let run_id = run_id.into();
        debug!(%run_id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            run_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for emitting events of one run without owning the bus
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<PlanEvent>,
    run_id: String,
}

impl EventEmitter {
    /// Fire-and-forget: with no subscribers the event is dropped
    fn emit(&self, event: PlanEvent) {
        debug!(event_type = event.event_type(), run_id = %self.run_id, "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    pub fn run_started(&self, destination: &str) {
        self.emit(PlanEvent::RunStarted {
            run_id: self.run_id.clone(),
            destination: destination.to_string(),
        });
    }

    pub fn run_completed(&self, plan_id: &str, annotations: usize) {
        self.emit(PlanEvent::RunCompleted {
            run_id: self.run_id.clone(),
            plan_id: plan_id.to_string(),
            annotations,
        });
    }

    pub fn run_failed(&self, phase: Phase, message: &str) {
        self.emit(PlanEvent::RunFailed {
            run_id: self.run_id.clone(),
            phase,
            message: message.to_string(),
        });
    }

    pub fn phase_started(&self, phase: Phase) {
        self.emit(PlanEvent::PhaseStarted {
            run_id: self.run_id.clone(),
            phase,
        });
    }

    pub fn phase_completed(&self, phase: Phase, duration_ms: u64) {
        self.emit(PlanEvent::PhaseCompleted {
            run_id: self.run_id.clone(),
            phase,
            duration_ms,
        });
    }

    pub fn step_started(&self, step: StepName, attempt: u32) {
        self.emit(PlanEvent::StepStarted {
            run_id: self.run_id.clone(),
            step,
            attempt,
        });
    }

    pub fn step_retrying(&self, step: StepName, attempt: u32, reason: &str) {
        self.emit(PlanEvent::StepRetrying {
            run_id: self.run_id.clone(),
            step,
            attempt,
            reason: reason.to_string(),
        });
    }

    pub fn step_succeeded(&self, step: StepName, attempt: u32, duration_ms: u64) {
        self.emit(PlanEvent::StepSucceeded {
            run_id: self.run_id.clone(),
            step,
            attempt,
            duration_ms,
        });
    }

    pub fn step_failed(&self, step: StepName, kind: FailureKind, message: &str) {
        self.emit(PlanEvent::StepFailed {
            run_id: self.run_id.clone(),
            step,
            kind,
            message: message.to_string(),
        });
    }

    pub fn placeholder(&self, section: &str, reason: &str) {
        self.emit(PlanEvent::Placeholder {
            run_id: self.run_id.clone(),
            section: section.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_event_bus_subscribe() {
        let bus = EventBus::new(100);
        assert_eq!(bus.subscriber_count(), 0);
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_bus_no_subscribers() {
        let bus = EventBus::new(100);
        // This should not panic even with no subscribers
        bus.emitter_for("run-1").run_started("Hue");
    }

    #[tokio::test]
    async fn test_event_emitter_convenience_methods() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();
        let emitter = bus.emitter_for("run-789");

        emitter.run_started("Da Lat");
        emitter.phase_started(Phase::Options);
        emitter.step_started(StepName::Logistics, 1);
        emitter.step_retrying(StepName::Logistics, 1, "timed out");
        emitter.step_failed(StepName::Logistics, FailureKind::Transient, "timed out");
        emitter.placeholder("flight", "logistics timed out");
        emitter.step_succeeded(StepName::Accommodation, 1, 20);
        emitter.phase_completed(Phase::Options, 40);
        emitter.run_completed("abc-plan", 1);

        for _ in 0..9 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.run_id(), "run-789");
        }

        // No more events
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = create_event_bus();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emitter_for("test").run_failed(Phase::Context, "weather step failed");

        let event1 = rx1.recv().await.unwrap();
        let event2 = rx2.recv().await.unwrap();
        assert_eq!(event1, event2);
        assert_eq!(event1.event_type(), "RunFailed");
    }
}
