//! Standing watches.

pub mod service;

pub use service::WatchService;
