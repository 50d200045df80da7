//! # puddle-auth
//!
//! Resolves access tokens into identities and answers the "may this user do
//! that to this path" question against the materialised grant table.

pub mod acl;
pub mod jwt;

pub use acl::AccessChecker;
pub use jwt::{JwtAuthenticator, JwtIssuer};
