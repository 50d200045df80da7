//! # puddle-database
//!
//! Persistent stores for the Puddle namespace: drop entries, permission
//! grants and watches. Each store is a trait with a PostgreSQL
//! implementation (sqlx) and an in-memory implementation used by tests and
//! single-process deployments.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{EntryStore, PermissionStore, Stores, WatchStore};
