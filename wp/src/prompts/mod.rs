//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files, one per specialist
//! step plus the destination suggestion prompt.
//!
//! Template loading chain:
//! 1. `.waypoint/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (project default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax. Step templates receive the step input
//! as `input`; the full input also goes to the model as the user message.

pub mod embedded;
mod loader;

pub use loader::PromptLoader;
