//! Waypoint - Conversational Trip Intake and Travel Planner
//!
//! Waypoint collects a complete trip request through a slot-filling
//! conversation, then plans the trip in five phases, fanning specialist steps
//! out concurrently inside each phase:
//!
//! ```text
//! context -> options -> selection -> analysis -> compilation
//! (weather)  (flights,   (pick,       (budget,     (plan)
//!             stays)      itinerary)   advisory,
//!                                      souvenirs)
//! ```
//!
//! # Core Concepts
//!
//! - **Load-bearing steps**: weather and itinerary failures abort the run
//! - **Placeholders**: every other failure becomes an annotated gap in the plan
//! - **One currency**: every amount is normalized to the canonical currency
//! - **Unverified prices**: prices that cannot be converted are flagged, never guessed
//!
//! # Modules
//!
//! - [`intake`] - Intake state machine and reply parsing
//! - [`orchestrator`] - Phase runner and option selection
//! - [`steps`] - Specialist contracts, failures and the candidate collector
//! - [`currency`] - Price parsing and currency normalization
//! - [`budget`] - Budget draft, validator and plan compiler
//! - [`storage`] - Session and plan storage
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod budget;
pub mod cli;
pub mod config;
pub mod currency;
pub mod domain;
pub mod events;
pub mod intake;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod repl;
pub mod report;
pub mod steps;
pub mod storage;

// Re-export commonly used types
pub use budget::{BudgetValidator, CompileError, PlanInputs, compile};
pub use config::{Config, LlmConfig};
pub use currency::{CurrencyNormalizer, RateLookup, StaticRates};
pub use domain::{
    BudgetReport, BudgetStatus, ConversationSession, IntakeState, RequestField, StepOutcome, TravelPlan, TravelRequest,
    TravelStyle, UnverifiedPrice,
};
pub use events::{EventBus, PlanEvent, create_event_bus};
pub use intake::{CatalogSuggester, DestinationSuggester, IntakeMachine, LlmSuggester};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use orchestrator::{Phase, PlanningError, PlanningOrchestrator, SelectionPolicy};
pub use prompts::PromptLoader;
pub use steps::{CandidateCollector, FailureKind, LlmSpecialist, ScriptedSpecialist, Specialist, StepFailure, StepName};
pub use storage::{FileStore, MemoryStore, SessionStore};
