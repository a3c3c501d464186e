//! Destination suggestion collaborator

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::CatalogEntry;
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::prompts::PromptLoader;

/// Answer of a destination suggester
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Destination(String),
    NoMatch,
}

/// Turns a free-text description of preferences into a destination
#[async_trait]
pub trait DestinationSuggester: Send + Sync {
    async fn suggest(&self, description: &str) -> Suggestion;
}

/// Offline suggester scoring a fixed catalogue by keyword overlap
pub struct CatalogSuggester {
    catalogue: Vec<CatalogEntry>,
}

impl CatalogSuggester {
    pub fn new(catalogue: Vec<CatalogEntry>) -> Self {
        debug!(entries = catalogue.len(), "CatalogSuggester::new: called");
        Self { catalogue }
    }

    /// Tags found in the description, plus a large bonus for naming the entry
    fn score(entry: &CatalogEntry, description: &str, words: &[String]) -> usize {
        let mut score = entry
            .tags
            .iter()
            .map(|tag| tag.to_lowercase())
            .filter(|tag| {
                if tag.contains(' ') {
                    description.contains(tag.as_str())
                } else {
                    words.iter().any(|w| w == tag)
                }
            })
            .count();
        if description.contains(&entry.name.to_lowercase()) {
            score += 100;
        }
        score
    }
}

#[async_trait]
impl DestinationSuggester for CatalogSuggester {
    async fn suggest(&self, description: &str) -> Suggestion {
        debug!(%description, "CatalogSuggester::suggest: called");
        let description = description.to_lowercase();
        let words: Vec<String> = description
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();

        // Strictly greater keeps the earliest entry on ties
        let mut best: Option<(&CatalogEntry, usize)> = None;
        for entry in &self.catalogue {
            let score = Self::score(entry, &description, &words);
            if score > 0 && best.is_none_or(|(_, s)| score > s) {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) => {
                info!(destination = %entry.name, score, "Catalogue suggestion");
                Suggestion::Destination(entry.name.clone())
            }
            None => {
                debug!("CatalogSuggester::suggest: no entry matched");
                Suggestion::NoMatch
            }
        }
    }
}

/// Suggester that asks a language model
///
/// A `NO_MATCH` answer, an empty answer or any error count as no match.
pub struct LlmSuggester {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    catalogue: Vec<CatalogEntry>,
    max_tokens: u32,
}

impl LlmSuggester {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, catalogue: Vec<CatalogEntry>) -> Self {
        Self {
            llm,
            prompts,
            catalogue,
            max_tokens: 64,
        }
    }
}

#[async_trait]
impl DestinationSuggester for LlmSuggester {
    async fn suggest(&self, description: &str) -> Suggestion {
        debug!(%description, "LlmSuggester::suggest: called");
        let system_prompt = match self.prompts.render(
            "suggest",
            &json!({ "preferences": description, "catalogue": &self.catalogue }),
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to render suggestion prompt");
                return Suggestion::NoMatch;
            }
        };

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(description)],
            max_tokens: self.max_tokens,
        };

        let content = match self.llm.complete(request).await {
            Ok(response) => response.content.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Suggestion request failed");
                return Suggestion::NoMatch;
            }
        };

        let answer = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '.' | '*'))
            .trim();

        if answer.is_empty() || answer.contains("NO_MATCH") || answer.chars().count() > 100 {
            debug!(%answer, "LlmSuggester::suggest: no usable destination");
            Suggestion::NoMatch
        } else {
            info!(destination = %answer, "Model suggestion");
            Suggestion::Destination(answer.to_string())
        }
    }
}
