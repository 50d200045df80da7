//! Permission grant entities.

pub mod model;

pub use model::PermissionGrant;
