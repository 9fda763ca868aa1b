//! Error type for rendering and mixing.
//!
//! Edit-list errors and external tool errors pass through unchanged so callers
//! can match on the original variant.

pub use cutlist_av::Error as AvError;
pub use cutlist_edit::Error as EditError;

/// Result type alias using the crate Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the render pipeline and the track mixer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An edit-list operation failed.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// An external tool or workspace operation failed.
    #[error(transparent)]
    Av(#[from] AvError),

    /// Configuration or cut sheet is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// The edit list had no fragments.
    pub fn is_empty_fragment(&self) -> bool {
        matches!(self, Self::Edit(EditError::EmptyFragment))
    }

    /// A range reached past the end of the timeline.
    pub fn is_out_of_duration(&self) -> bool {
        matches!(self, Self::Edit(EditError::OutOfDuration { .. }))
    }

    /// The destination exists and overwriting was not requested.
    pub fn is_file_exists(&self) -> bool {
        matches!(self, Self::Av(AvError::FileExists { .. }))
    }

    /// An external invocation exited with a non-zero status.
    pub fn is_command_failed(&self) -> bool {
        matches!(self, Self::Av(AvError::CommandFailed { .. }))
    }
}
