//! # puddle-storage
//!
//! [`BlobStore`](puddle_core::traits::BlobStore) providers for Puddle. The
//! namespace engine mirrors every committed structural change here.

pub mod manager;
pub mod providers;

pub use manager::build_blob_store;
