//! HS256 access tokens.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::Claims;
pub use decoder::JwtAuthenticator;
pub use encoder::JwtIssuer;
