//! Domain events emitted by namespace mutations.
//!
//! Events are handed to an [`EventPublisher`](crate::traits::EventPublisher)
//! and fanned out by the real-time engine to observer, watcher and identity
//! topics.

pub mod drop;
pub mod watch;

pub use drop::DropEvent;
pub use watch::WatchEvent;
