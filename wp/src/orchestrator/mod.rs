//! Phase orchestrator
//!
//! Drives one complete trip request through Context, Options, Selection,
//! Analysis and Compilation, and returns the compiled plan or the phase
//! that made planning impossible.

mod error;
mod phase;
mod runner;
mod selection;

pub use error::PlanningError;
pub use phase::Phase;
pub use runner::PlanningOrchestrator;
pub use selection::{BELOW_FLOOR_NOTE, Choice, SelectionPolicy, UNVERIFIED_NOTE};
