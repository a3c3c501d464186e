//! Conversation session owned by the intake state machine

use serde::{Deserialize, Serialize};
use sessionstore::{Record, now_ms};
use tracing::debug;

use super::id::generate_id;
use super::request::{RequestDraft, RequestField, TravelRequest};

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    /// Unix milliseconds
    pub at: i64,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            at: now_ms(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            at: now_ms(),
        }
    }
}

/// Where the intake dialogue currently is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IntakeState {
    /// Prompting for `missing[0]`; the rest follow in priority order
    Collecting { missing: Vec<RequestField> },
    /// Destination unknown; waiting for a free-text description of preferences
    Suggesting,
    /// A suggested destination awaits a yes/no
    SuggestionOffered { destination: String },
    /// All mandatory fields set; waiting for confirmation (or notes)
    Confirming,
    /// Request frozen
    Complete,
}

impl IntakeState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Collecting { .. } => "collecting",
            Self::Suggesting => "suggesting",
            Self::SuggestionOffered { .. } => "suggestion_offered",
            Self::Confirming => "confirming",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for IntakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single user's intake conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub turns: Vec<Turn>,
    pub draft: RequestDraft,
    pub state: IntakeState,
    /// Set once the request is confirmed
    #[serde(default)]
    pub request: Option<TravelRequest>,
    /// Consecutive unparseable replies for the currently prompted slot
    #[serde(default)]
    pub reprompts: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ConversationSession {
    /// New session collecting every mandatory field in `order`
    pub fn new(order: &[RequestField]) -> Self {
        Self::with_id(generate_id("session", ""), order)
    }

    /// Create a session with a specific ID (for testing or recovery)
    pub fn with_id(id: impl Into<String>, order: &[RequestField]) -> Self {
        let now = now_ms();
        let draft = RequestDraft::default();
        Self {
            id: id.into(),
            turns: Vec::new(),
            state: IntakeState::Collecting {
                missing: draft.missing_fields(order),
            },
            draft,
            request: None,
            reprompts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// The completion flag
    pub fn is_complete(&self) -> bool {
        self.state == IntakeState::Complete && self.request.is_some()
    }

    /// Mandatory fields not yet collected
    pub fn missing_fields(&self) -> Vec<RequestField> {
        match &self.state {
            IntakeState::Collecting { missing } => missing.clone(),
            IntakeState::Suggesting | IntakeState::SuggestionOffered { .. } => {
                self.draft.missing_fields(&RequestField::MANDATORY)
            }
            IntakeState::Confirming | IntakeState::Complete => Vec::new(),
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = now_ms();
    }

    pub fn last_assistant_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Assistant)
            .map(|t| t.text.as_str())
    }
}

impl Record for ConversationSession {
    fn id(&self) -> &str {
        debug!(%self.id, "ConversationSession::id: called");
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "sessions"
    }
}
