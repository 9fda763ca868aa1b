//! Error types for edit-list operations.

/// Result type alias using the edit-list Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the edit algebra.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// An operation that needs at least one fragment was called on an empty chunk.
    #[error("edit list has no fragments")]
    EmptyFragment,

    /// The requested range reaches past the end of the timeline.
    #[error("range {start}+{length} exceeds timeline duration {duration}")]
    OutOfDuration {
        start: f64,
        length: f64,
        duration: f64,
    },

    /// A fragment would violate `start >= 0` or `duration > 0`.
    #[error("invalid fragment: {0}")]
    InvalidFragment(String),

    /// A target duration was negative or not finite.
    #[error("invalid duration: {0}")]
    InvalidDuration(f64),

    /// A split was requested into zero parts.
    #[error("split count must be at least 1")]
    InvalidCount,
}

impl Error {
    /// Create an out-of-duration error for the given range.
    pub fn out_of_duration(start: f64, length: f64, duration: f64) -> Self {
        Self::OutOfDuration {
            start,
            length,
            duration,
        }
    }

    /// Create an invalid fragment error.
    pub fn invalid_fragment<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFragment(msg.into())
    }
}
