//! Collaborator traits implemented by the outer crates.

pub mod auth;
pub mod events;
pub mod storage;

pub use auth::{Authenticator, Identity};
pub use events::EventPublisher;
pub use storage::BlobStore;
