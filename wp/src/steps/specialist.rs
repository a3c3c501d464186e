//! Specialist collaborator: ask a structured question, get a structured answer

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::{StepFailure, StepName};
use crate::llm::{CompletionRequest, LlmClient, Message, StopReason, extract_json};
use crate::prompts::PromptLoader;

/// Performs one specialist step
///
/// Input and output are step-specific JSON records; see the step contracts.
/// Implementations must not retry or enforce timeouts themselves.
#[async_trait]
pub trait Specialist: Send + Sync {
    async fn invoke(&self, step: StepName, input: Value) -> Result<Value, StepFailure>;
}

/// Specialist backed by a language model
///
/// Each step has a prompt template named after the step. The rendered
/// template becomes the system prompt and the step input is sent as the
/// user message; the first JSON object in the reply is the step output.
pub struct LlmSpecialist {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl LlmSpecialist {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        debug!(%max_tokens, "LlmSpecialist::new: called");
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }
}

#[async_trait]
impl Specialist for LlmSpecialist {
    async fn invoke(&self, step: StepName, input: Value) -> Result<Value, StepFailure> {
        debug!(%step, "LlmSpecialist::invoke: called");
        let system_prompt = self
            .prompts
            .render(step.name(), &serde_json::json!({ "input": &input }))
            .map_err(|e| StepFailure::validation(format!("prompt for {} step: {}", step, e)))?;

        let input_json = serde_json::to_string_pretty(&input)
            .map_err(|e| StepFailure::validation(format!("encoding {} input: {}", step, e)))?;

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(format!(
                "Input:\n```json\n{}\n```\nRespond with a single JSON object only.",
                input_json
            ))],
            max_tokens: self.max_tokens,
        };

        let response = self.llm.complete(request).await?;
        info!(%step, output_tokens = response.usage.output_tokens, "Specialist replied");

        let content = response
            .content
            .ok_or_else(|| StepFailure::validation(format!("{} step returned no text", step)))?;

        extract_json(&content).ok_or_else(|| {
            debug!(
                %step,
                reply_len = content.len(),
                stop_reason = ?response.stop_reason,
                "LlmSpecialist::invoke: no JSON in reply"
            );
            if response.stop_reason == StopReason::MaxTokens {
                StepFailure::validation(format!("{} step reply was cut off at the token limit", step))
            } else {
                StepFailure::validation(format!("{} step reply contained no JSON object", step))
            }
        })
    }
}
