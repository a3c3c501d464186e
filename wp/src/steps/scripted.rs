//! Specialist that replays canned outputs
//!
//! Used by tests and by `wp plan --replay` for offline runs. Each step has a
//! queue of scripted results; once a queue is down to its last entry that
//! entry repeats.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{FailureKind, Specialist, StepFailure, StepName};

/// One scripted result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptedReply {
    /// `{"fail": "transient", "message": "..."}`
    Failure {
        fail: FailureKind,
        #[serde(default)]
        message: String,
    },
    /// `{"delay_ms": 5000, "output": {...}}`
    Delayed { delay_ms: u64, output: Value },
    /// Any other JSON value is returned as-is
    Output(Value),
}

/// Replays per-step scripts and counts calls
#[derive(Default)]
pub struct ScriptedSpecialist {
    scripts: Mutex<HashMap<StepName, VecDeque<ScriptedReply>>>,
    calls: Mutex<HashMap<StepName, usize>>,
}

impl ScriptedSpecialist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful output
    pub fn with_output(self, step: StepName, output: Value) -> Self {
        self.push(step, ScriptedReply::Output(output));
        self
    }

    /// Queue a failure
    pub fn with_failure(self, step: StepName, kind: FailureKind, message: &str) -> Self {
        self.push(
            step,
            ScriptedReply::Failure {
                fail: kind,
                message: message.to_string(),
            },
        );
        self
    }

    /// Queue an output that arrives after a delay
    pub fn with_delay(self, step: StepName, delay: Duration, output: Value) -> Self {
        self.push(
            step,
            ScriptedReply::Delayed {
                delay_ms: delay.as_millis() as u64,
                output,
            },
        );
        self
    }

    pub fn push(&self, step: StepName, reply: ScriptedReply) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(step).or_default().push_back(reply);
        }
    }

    /// Load a fixtures file: `{"weather": <reply or [replies]>, ...}`
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(?path, "ScriptedSpecialist::from_file: called");
        let content = std::fs::read_to_string(path).context(format!("Failed to read fixtures {}", path.display()))?;
        let fixtures: HashMap<String, Value> =
            serde_json::from_str(&content).context(format!("Failed to parse fixtures {}", path.display()))?;

        let specialist = Self::new();
        for (name, value) in fixtures {
            let step = StepName::parse(&name).ok_or_else(|| eyre::eyre!("Unknown step in fixtures: {}", name))?;
            let replies = match value {
                Value::Array(items) => items,
                single => vec![single],
            };
            for reply in replies {
                let reply: ScriptedReply = serde_json::from_value(reply)?;
                specialist.push(step, reply);
            }
        }
        Ok(specialist)
    }

    /// Number of invocations of a step so far
    pub fn calls(&self, step: StepName) -> usize {
        self.calls
            .lock()
            .map(|c| c.get(&step).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|c| c.values().sum()).unwrap_or(0)
    }

    fn next_reply(&self, step: StepName) -> Option<ScriptedReply> {
        let mut scripts = self.scripts.lock().ok()?;
        let queue = scripts.get_mut(&step)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Specialist for ScriptedSpecialist {
    async fn invoke(&self, step: StepName, _input: Value) -> Result<Value, StepFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(step).or_default() += 1;
        }
        debug!(%step, "ScriptedSpecialist::invoke: called");

        match self.next_reply(step) {
            Some(ScriptedReply::Output(output)) => Ok(output),
            Some(ScriptedReply::Delayed { delay_ms, output }) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(output)
            }
            Some(ScriptedReply::Failure { fail, message }) => Err(StepFailure::new(fail, message)),
            None => Err(StepFailure::new(
                FailureKind::Unavailable,
                format!("no scripted reply for {} step", step),
            )),
        }
    }
}
