//! Specialist steps
//!
//! Step names and typed contracts, the failure taxonomy, the specialist
//! collaborator (LLM-backed or scripted) and the collector that calls it
//! with a timeout and retry policy.

mod collector;
mod contracts;
mod failure;
mod scripted;
mod specialist;

pub use collector::CandidateCollector;
pub use contracts::{
    AccommodationInput, AccommodationOutput, AccommodationStep, AdvisoryInput, AdvisoryStep, BudgetInput, BudgetLine,
    BudgetOutput, BudgetStep, ItineraryInput, ItineraryStep, LogisticsInput, LogisticsOutput, LogisticsStep,
    SouvenirInput, SouvenirOutput, SouvenirStep, StepContract, StepName, WeatherInput, WeatherStep,
};
pub use failure::{FailureKind, StepFailure, disposition};
pub use scripted::{ScriptedReply, ScriptedSpecialist};
pub use specialist::{LlmSpecialist, Specialist};
