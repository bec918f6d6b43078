//! Convenience result type alias for Hearth.

use crate::error::AppError;

/// A specialized `Result` type for Hearth operations.
pub type AppResult<T> = Result<T, AppError>;
