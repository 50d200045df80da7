//! Account lifecycle.

pub mod service;

pub use service::{AccountRemoval, AccountService};
