//! Planning progress events
//!
//! The orchestrator and the candidate collector emit a [`PlanEvent`] for
//! every phase boundary and step attempt. Consumers such as the CLI progress
//! printer subscribe to the [`EventBus`].
//!
//! ```rust,ignore
//! let bus = Arc::new(EventBus::with_default_capacity());
//! let mut rx = bus.subscribe();
//! let plan = orchestrator.with_events(bus.clone()).plan(&request).await?;
//! while let Ok(event) = rx.try_recv() {
//!     println!("{}", event.describe());
//! }
//! ```

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use types::PlanEvent;
