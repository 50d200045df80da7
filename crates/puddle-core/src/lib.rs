//! # puddle-core
//!
//! Core crate for Puddle. Contains the unified error system, configuration
//! schemas, typed identifiers, the path utilities that encode the drop
//! hierarchy, namespace events, and the collaborator traits implemented by
//! other crates (blob storage, token authentication, event publishing).
//!
//! This crate has **no** internal dependencies on other Puddle crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
