//! # puddle-realtime
//!
//! Real-time fan-out for namespace events. Provides:
//!
//! - Authenticated connection registration with per-user caps
//! - Three topic families: path observers, path watchers and user identity
//! - An [`EventBus`] implementing the core `EventPublisher` seam
//! - Stale-connection sweeping driven by client pongs

pub mod bus;
pub mod channel;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod server;

pub use bus::EventBus;
pub use channel::registry::TopicRegistry;
pub use connection::manager::ConnectionManager;
pub use server::RealtimeEngine;
