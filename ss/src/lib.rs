//! SessionStore - last-write-wins JSON record store
//!
//! Persists conversation sessions and compiled travel plans by opaque id.
//! No transactions are offered: every write replaces the whole record and
//! the last completed write for an id wins.
//!
//! # Architecture
//!
//! ```text
//! store/
//! ├── sessions/
//! │   ├── {session_id}.json
//! │   └── ...
//! └── plans/
//!     ├── {plan_id}.json
//!     └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sessionstore::{Record, Store};
//!
//! let store = Store::open(".sessionstore")?;
//! store.put(&session)?;
//! let loaded: Option<Session> = store.get(&session.id)?;
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{CollectionStats, Record, RecordEntry, Store};

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
