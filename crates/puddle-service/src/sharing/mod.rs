//! Grant inspection and management.

pub mod service;

pub use service::SharingService;
