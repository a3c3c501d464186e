//! Budget drafting, validation and plan compilation
//!
//! Everything here is deterministic over its inputs; the only await is the
//! currency normalization of budget estimate lines.

mod compiler;
mod draft;
mod validator;

pub use compiler::{CompileError, PlanInputs, compile};
pub use draft::{BudgetDraft, FALLBACK_NOTE, build_draft};
pub use validator::BudgetValidator;
