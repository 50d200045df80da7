//! Typed user identifier.
//!
//! Users are identified by their account name, which is also the first
//! segment of every path in their puddle. The newtype keeps user ids from
//! being mixed up with paths in store signatures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Unique identifier for a user (the account name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create an identifier, rejecting values that cannot be a path segment.
    pub fn parse(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        if value.is_empty()
            || value.contains(crate::types::path::SEPARATOR)
            || value == "."
            || value == ".."
            || value.chars().any(char::is_control)
        {
            return Err(AppError::validation(format!("Invalid user id: '{value}'")));
        }
        Ok(Self(value))
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this user's puddle root (`<uid>/`).
    pub fn puddle_root(&self) -> String {
        format!("{}{}", self.0, crate::types::path::SEPARATOR)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Unchecked conversion; untrusted input goes through [`UserId::parse`].
impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_separator() {
        assert!(UserId::parse("alice").is_ok());
        assert!(UserId::parse("al/ice").is_err());
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse("..").is_err());
    }

    #[test]
    fn test_puddle_root() {
        assert_eq!(UserId::from("bob").puddle_root(), "bob/");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = UserId::from("carol");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"carol\"");
    }
}
