//! Drop browsing and structural operations.

pub mod service;

pub use service::{DropInfo, DropService};
