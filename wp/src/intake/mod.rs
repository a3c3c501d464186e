//! Conversational trip intake
//!
//! Collects a complete trip request through slot-filling dialogue:
//!
//! ```text
//! collecting(missing) --all set--> confirming --yes/none--> complete
//!      |    ^                         |
//!      |    +----- "change X" --------+
//!      v
//! suggesting --> suggestion_offered --yes--> collecting(next)
//! ```

mod machine;
pub mod messages;
pub mod parse;
mod suggest;

pub use machine::IntakeMachine;
pub use suggest::{CatalogSuggester, DestinationSuggester, LlmSuggester, Suggestion};
