//! Convenience result type alias for Puddle.

use crate::error::AppError;

/// A specialized `Result` type for Puddle operations.
pub type AppResult<T> = Result<T, AppError>;
