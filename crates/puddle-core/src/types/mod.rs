//! Core type definitions used across the Puddle workspace.

pub mod filter;
pub mod id;
pub mod path;
pub mod permission;

pub use filter::GrantFilter;
pub use id::UserId;
pub use permission::{GrantKind, PermissionKind};
