//! Anthropic Messages API client

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::client::Endpoint;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

const API_VERSION: &str = "2023-06-01";

/// Client for Anthropic's `/v1/messages`
pub struct AnthropicClient {
    endpoint: Endpoint,
}

impl AnthropicClient {
    /// Build a client; the API key comes from the env var named in config
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    /// The system prompt travels outside the message list
    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        serde_json::json!({
            "model": self.endpoint.model,
            "max_tokens": self.endpoint.token_budget(request.max_tokens),
            "system": request.system_prompt,
            "messages": messages,
        })
    }
}

impl MessagesResponse {
    /// Text blocks are concatenated; thinking and other block types are dropped
    fn into_completion(self) -> CompletionResponse {
        let text: String = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        CompletionResponse {
            content: (!text.is_empty()).then_some(text),
            stop_reason: StopReason::from_anthropic(self.stop_reason.as_deref().unwrap_or("end_turn")),
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, max_tokens = request.max_tokens, "AnthropicClient::complete: called");
        let builder = self
            .endpoint
            .post("/v1/messages")
            .header("x-api-key", &self.endpoint.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(&request));

        let response: MessagesResponse = self.endpoint.send(builder).await?;
        Ok(response.into_completion())
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
