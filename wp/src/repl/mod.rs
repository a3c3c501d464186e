//! Interactive intake chat
//!
//! A line-oriented conversation that fills a trip request, persists the
//! session after every turn and, once the request is confirmed, can hand it
//! to the planner.
//!
//! Commands:
//! - `/help` - Show available commands
//! - `/reset` - Start the request over
//! - `/history` - Show the conversation so far
//! - `/summary` - Show the collected details
//! - `/quit` - Exit

mod session;

pub use session::ChatSession;
