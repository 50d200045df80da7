//! Multi-store consistency for structural mutations.

pub mod coordinator;
pub mod locks;

pub use coordinator::{NamespaceCoordinator, RepairReport};
pub use locks::{NamespaceGuard, NamespaceLocks};
