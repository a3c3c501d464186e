//! Candidate collector: one guarded specialist call
//!
//! Wraps a [`Specialist`] with the per-step timeout, the retry policy and
//! the run-wide concurrency bound, and decodes the reply into the step's
//! typed output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::{Specialist, StepContract, StepFailure};
use crate::events::EventEmitter;

/// Invokes specialist steps for one planning run
pub struct CandidateCollector {
    specialist: Arc<dyn Specialist>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
    permits: Arc<Semaphore>,
    events: Option<EventEmitter>,
}

impl CandidateCollector {
    pub fn new(specialist: Arc<dyn Specialist>, timeout: Duration, max_concurrent: usize) -> Self {
        debug!(?timeout, %max_concurrent, "CandidateCollector::new: called");
        Self {
            specialist,
            timeout,
            max_retries: 1,
            backoff: Duration::ZERO,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            events: None,
        }
    }

    /// Retries after a transient failure, and the pause before each
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = Some(events);
        self
    }

    /// Run a step to completion: success, or the last failure once retries are spent
    ///
    /// A reply arriving after the deadline is dropped along with its future.
    pub async fn collect<C: StepContract>(&self, input: &C::Input) -> Result<C::Output, StepFailure> {
        let step = C::STEP;
        debug!(%step, "CandidateCollector::collect: called");

        let payload = serde_json::to_value(input)
            .map_err(|e| StepFailure::validation(format!("encoding {} input: {}", step, e)))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let started = Instant::now();
            if let Some(events) = &self.events {
                events.step_started(step, attempt);
            }

            let result = {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|_| StepFailure::transient("step pool closed"))?;
                debug!(%step, attempt, "CandidateCollector::collect: permit acquired");
                match tokio::time::timeout(self.timeout, self.specialist.invoke(step, payload.clone())).await {
                    Ok(reply) => reply.and_then(|value| decode::<C>(value)),
                    Err(_) => Err(StepFailure::timed_out(step, self.timeout.as_millis() as u64)),
                }
            };

            match result {
                Ok(output) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    debug!(%step, attempt, duration_ms, "CandidateCollector::collect: step succeeded");
                    if let Some(events) = &self.events {
                        events.step_succeeded(step, attempt, duration_ms);
                    }
                    return Ok(output);
                }
                Err(failure) if failure.kind.is_retryable() && attempt <= self.max_retries => {
                    warn!(%step, attempt, error = %failure, "Step failed, retrying");
                    if let Some(events) = &self.events {
                        events.step_retrying(step, attempt, &failure.message);
                    }
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
                Err(failure) => {
                    warn!(%step, attempt, error = %failure, "Step failed");
                    if let Some(events) = &self.events {
                        events.step_failed(step, failure.kind, &failure.message);
                    }
                    return Err(failure);
                }
            }
        }
    }
}

/// Decode and check a step reply
fn decode<C: StepContract>(value: serde_json::Value) -> Result<C::Output, StepFailure> {
    let output: C::Output = serde_json::from_value(value)
        .map_err(|e| StepFailure::validation(format!("malformed {} output: {}", C::STEP, e)))?;
    C::check(&output).map_err(|e| StepFailure::validation(format!("invalid {} output: {}", C::STEP, e)))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBus, PlanEvent};
    use crate::steps::{FailureKind, ScriptedSpecialist, StepName, WeatherInput, WeatherStep};
    use chrono::NaiveDate;
    use serde_json::json;

    fn input() -> WeatherInput {
        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        WeatherInput {
            destination: "Sa Pa".to_string(),
            departure_date: date,
            return_date: date,
            trip_duration: 1,
        }
    }

    fn weather() -> serde_json::Value {
        json!({"season": "Winter", "summary": "Cold and misty"})
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let specialist = Arc::new(
            ScriptedSpecialist::new()
                .with_failure(StepName::Weather, FailureKind::Transient, "overloaded")
                .with_output(StepName::Weather, weather()),
        );
        let collector = CandidateCollector::new(specialist.clone(), Duration::from_secs(5), 3);

        let output = collector.collect::<WeatherStep>(&input()).await.unwrap();
        assert_eq!(output.season, "Winter");
        assert_eq!(specialist.calls(StepName::Weather), 2);
    }

    #[tokio::test]
    async fn test_validation_failure_not_retried() {
        let specialist = Arc::new(ScriptedSpecialist::new().with_output(StepName::Weather, json!({"season": 42})));
        let collector = CandidateCollector::new(specialist.clone(), Duration::from_secs(5), 3);

        let failure = collector.collect::<WeatherStep>(&input()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Validation);
        assert!(failure.message.contains("malformed weather output"));
        assert_eq!(specialist.calls(StepName::Weather), 1);
    }

    #[tokio::test]
    async fn test_contract_check_failure_is_validation() {
        let specialist = Arc::new(
            ScriptedSpecialist::new().with_output(StepName::Weather, json!({"season": "", "summary": " "})),
        );
        let collector = CandidateCollector::new(specialist, Duration::from_secs(5), 3);
        let failure = collector.collect::<WeatherStep>(&input()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Validation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_twice_gives_up() {
        let specialist =
            Arc::new(ScriptedSpecialist::new().with_delay(StepName::Weather, Duration::from_secs(600), weather()));
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();
        let collector = CandidateCollector::new(specialist.clone(), Duration::from_secs(30), 3)
            .with_events(bus.emitter_for("run-1"));

        let failure = collector.collect::<WeatherStep>(&input()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transient);
        assert!(failure.message.contains("timed out"));
        assert_eq!(specialist.calls(StepName::Weather), 2);

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.event_type());
        }
        assert_eq!(kinds, vec!["StepStarted", "StepRetrying", "StepStarted", "StepFailed"]);
    }

    #[tokio::test]
    async fn test_zero_retries() {
        let specialist = Arc::new(ScriptedSpecialist::new().with_failure(
            StepName::Weather,
            FailureKind::Transient,
            "overloaded",
        ));
        let collector =
            CandidateCollector::new(specialist.clone(), Duration::from_secs(5), 1).with_retries(0, Duration::ZERO);
        assert!(collector.collect::<WeatherStep>(&input()).await.is_err());
        assert_eq!(specialist.calls(StepName::Weather), 1);
    }

    #[test]
    fn test_event_type_names() {
        let event = PlanEvent::StepStarted {
            run_id: "r".to_string(),
            step: StepName::Budget,
            attempt: 1,
        };
        assert_eq!(event.event_type(), "StepStarted");
    }
}
