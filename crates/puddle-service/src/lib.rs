//! # puddle-service
//!
//! The namespace engine and the authorized operations built on it.
//!
//! [`NamespaceCoordinator`] is the only place that mutates more than one
//! store at a time. The facades (`DropService`, `SharingService`,
//! `WatchService`, `AccountService`) check permissions through
//! `AccessChecker` and then delegate to it.

pub mod account;
pub mod app;
pub mod context;
pub mod drops;
pub mod namespace;
pub mod sharing;
pub mod watches;

pub use account::AccountService;
pub use app::AppServices;
pub use context::RequestContext;
pub use drops::DropService;
pub use namespace::{NamespaceCoordinator, NamespaceLocks};
pub use sharing::SharingService;
pub use watches::WatchService;
