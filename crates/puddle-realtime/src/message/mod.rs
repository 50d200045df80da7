//! Messages exchanged with connected clients.

pub mod types;

pub use types::{InboundMessage, OutboundMessage};
