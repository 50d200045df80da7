//! # puddle-entity
//!
//! Row models for the Puddle namespace. Every struct in this crate mirrors a
//! table row and derives `Debug`, `Clone`, `Serialize`, `Deserialize` and
//! `sqlx::FromRow`.

pub mod drop;
pub mod permission;
pub mod watch;
