//! Event system for ledger and session actions.
//!
//! Events are fired by actions after their change has been committed. If no
//! listeners are registered, they are silently ignored.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chorepool::register_event_listeners;
//! use chorepool::events::listeners::LoggingListener;
//!
//! fn main() {
//!     register_event_listeners(|registry| {
//!         registry.listen(LoggingListener::new());
//!     });
//! }
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use chorepool::events::{LedgerEvent, Listener};
//! use async_trait::async_trait;
//!
//! struct ScoreboardListener;
//!
//! #[async_trait]
//! impl Listener for ScoreboardListener {
//!     async fn handle(&self, event: &LedgerEvent) {
//!         if let LedgerEvent::TaskCompleted { group_id, score, .. } = event {
//!             // push the new score to connected clients
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::LedgerEvent;
pub use listener::Listener;
pub use registry::{dispatch, register_event_listeners, EventRegistry};
