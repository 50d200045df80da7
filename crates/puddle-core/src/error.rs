//! Unified application error types for Puddle.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] is the only part
//! callers are expected to branch on.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A lookup targeted a path that has no entry.
    NotFound,
    /// A create, copy or rename target is already taken.
    AlreadyExists,
    /// Malformed path, directory/file mismatch, self-containment violation,
    /// or an attempt to remove a protected puddle root.
    InvalidPath,
    /// An intended delete affected zero entries.
    DeletionFailed,
    /// The caller lacks the permission kind required by the operation.
    InsufficientPermission,
    /// A token could not be resolved into an identity.
    InvalidToken,
    /// A token was well-formed but has expired.
    ExpiredToken,
    /// Input validation failed (unknown permission kind, unknown user, ...).
    Validation,
    /// A database error occurred.
    Database,
    /// A blob storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// HTTP status code the client-facing layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidPath | Self::DeletionFailed | Self::Validation => 400,
            Self::InvalidToken | Self::ExpiredToken => 401,
            Self::InsufficientPermission => 403,
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::Database
            | Self::Storage
            | Self::Configuration
            | Self::Serialization
            | Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AlreadyExists => write!(f, "ALREADY_EXISTS"),
            Self::InvalidPath => write!(f, "INVALID_PATH"),
            Self::DeletionFailed => write!(f, "DELETION_FAILED"),
            Self::InsufficientPermission => write!(f, "INSUFFICIENT_PERMISSION"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::ExpiredToken => write!(f, "EXPIRED_TOKEN"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Puddle.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an already-exists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, message)
    }

    /// Create an invalid-path error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPath, message)
    }

    /// Create a deletion-failed error.
    pub fn deletion_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeletionFailed, message)
    }

    /// Create an insufficient-permission error.
    pub fn insufficient_permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientPermission, message)
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create an expired-token error.
    pub fn expired_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpiredToken, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns true when this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_kind_code() {
        let err = AppError::invalid_path("cannot delete puddle root");
        assert_eq!(err.to_string(), "INVALID_PATH: cannot delete puddle root");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("disk gone");
        let err: AppError = io.into();
        assert!(err.source.is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Storage);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorKind::DeletionFailed.http_status(), 400);
        assert_eq!(ErrorKind::ExpiredToken.http_status(), 401);
        assert_eq!(ErrorKind::InsufficientPermission.http_status(), 403);
        assert_eq!(ErrorKind::AlreadyExists.http_status(), 409);
    }
}
