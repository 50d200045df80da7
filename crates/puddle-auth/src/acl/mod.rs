//! Path permission checks.

pub mod checker;

pub use checker::AccessChecker;
