use thiserror::Error;

/// Errors raised by the roster and aggregation operations.
///
/// Both kinds are recoverable: the operation is aborted and the caller's
/// state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    /// Missing or malformed input
    #[error("validation error: {0}")]
    Validation(String),
    /// No roster entry with this sequence number
    #[error("no roster entry with sequence number {0}")]
    NotFound(u32),
}

impl AttendanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
