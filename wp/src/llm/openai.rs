//! OpenAI Chat Completions client
//!
//! Also works against OpenAI-compatible gateways through `llm.base-url`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::client::Endpoint;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Model families that reject `max_tokens` in favour of `max_completion_tokens`
const COMPLETION_TOKEN_MODELS: &[&str] = &["gpt-5", "o1", "o3", "o4"];

/// Client for `/v1/chat/completions`
pub struct OpenAIClient {
    endpoint: Endpoint,
}

impl OpenAIClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    /// The system prompt goes first in the message list
    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> =
            std::iter::once(serde_json::json!({"role": "system", "content": request.system_prompt}))
                .chain(
                    request
                        .messages
                        .iter()
                        .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content})),
                )
                .collect();

        let token_field = if COMPLETION_TOKEN_MODELS
            .iter()
            .any(|prefix| self.endpoint.model.starts_with(prefix))
        {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };

        let mut body = serde_json::json!({
            "model": self.endpoint.model,
            "messages": messages,
        });
        body[token_field] = serde_json::json!(self.endpoint.token_budget(request.max_tokens));
        body
    }
}

impl ChatResponse {
    /// Only the first choice is used
    fn into_completion(self) -> CompletionResponse {
        let (content, stop_reason) = match self.choices.into_iter().next() {
            Some(choice) => (choice.message.content, StopReason::from_openai(choice.finish_reason.as_deref())),
            None => (None, StopReason::EndTurn),
        };

        CompletionResponse {
            content,
            stop_reason,
            usage: TokenUsage {
                input_tokens: self.usage.prompt_tokens,
                output_tokens: self.usage.completion_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, max_tokens = request.max_tokens, "OpenAIClient::complete: called");
        let builder = self
            .endpoint
            .post("/v1/chat/completions")
            .bearer_auth(&self.endpoint.api_key)
            .json(&self.request_body(&request));

        let response: ChatResponse = self.endpoint.send(builder).await?;
        Ok(response.into_completion())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client(model: &str, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            endpoint: Endpoint::for_tests(model, max_tokens),
        }
    }

    fn request(max_tokens: u32) -> CompletionRequest {
        CompletionRequest {
            system_prompt: "You are a souvenir specialist".to_string(),
            messages: vec![Message::user("Hoi An, 3 days")],
            max_tokens,
        }
    }

    #[test]
    fn test_request_body_puts_system_first() {
        let body = client("gpt-4o", 8192).request_body(&request(1000));

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are a souvenir specialist");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hoi An, 3 days");
    }

    #[test]
    fn test_reasoning_models_use_completion_tokens() {
        let body = client("gpt-4o", 1000).request_body(&request(5000));
        assert_eq!(body["max_tokens"], 1000);

        let body = client("o3-mini", 1000).request_body(&request(5000));
        assert_eq!(body["max_completion_tokens"], 1000);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_uses_first_choice() {
        let json = r#"{
            "choices": [
                {"message": {"content": "Da Lat"}, "finish_reason": "stop"},
                {"message": {"content": "Sa Pa"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 7, "completion_tokens": 2}
        }"#;
        let response = serde_json::from_str::<ChatResponse>(json).unwrap().into_completion();
        assert_eq!(response.content.as_deref(), Some("Da Lat"));
        assert_eq!(response.usage.input_tokens, 7);
        assert_eq!(response.usage.output_tokens, 2);
    }

    #[test]
    fn test_response_without_choices_or_usage() {
        let response = serde_json::from_str::<ChatResponse>(r#"{"choices": []}"#)
            .unwrap()
            .into_completion();
        assert!(response.content.is_none());
        assert_eq!(response.usage.total(), 0);
    }
}
