//! Scoped working directory for render operations.
//!
//! A [`Workspace`] owns a temporary directory for converted sources and
//! intermediate timeline files. The directory is removed when the workspace
//! is dropped, so every exit path (success, error propagation, unwinding)
//! cleans up after itself.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Extension of the lossless intermediate format every source is normalized to.
pub const INTERMEDIATE_EXTENSION: &str = "wav";

/// Temporary working directory for one render call.
///
/// # Example
///
/// ```no_run
/// use cutlist_av::Workspace;
/// use std::path::Path;
///
/// let workspace = Workspace::new()?;
/// let timeline = workspace.temp_file("timeline.wav");
/// // ... external tools write the timeline ...
/// workspace.finalize(&timeline, Path::new("out.wav"), false)?;
/// # Ok::<(), cutlist_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("cutlist-")
            .tempdir()
            .map_err(|e| Error::Workspace(format!("failed to create temp dir: {e}")))?;
        tracing::debug!("Created workspace {}", temp_dir.path().display());
        Ok(Self { temp_dir })
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a temp file path with the given name.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Deterministic location of the intermediate-format copy of `source`,
    /// named by the SHA-256 digest of the source path.
    pub fn cache_file(&self, source: &Path) -> PathBuf {
        let digest = Sha256::digest(source.to_string_lossy().as_bytes());
        self.temp_file(&format!(
            "{}.{}",
            hex::encode(digest),
            INTERMEDIATE_EXTENSION
        ))
    }

    /// Move a finished file out of the workspace to `destination`.
    ///
    /// Tries a rename first and falls back to copy+remove across filesystems.
    /// A partially copied destination is removed again on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileExists`] if `destination` exists and `overwrite`
    /// is false, or a workspace error if `file` is missing or cannot be moved.
    pub fn finalize(&self, file: &Path, destination: &Path, overwrite: bool) -> Result<PathBuf> {
        if !file.exists() {
            return Err(Error::Workspace(format!(
                "output file does not exist: {}",
                file.display()
            )));
        }

        if destination.exists() && !overwrite {
            return Err(Error::file_exists(destination));
        }

        if fs::rename(file, destination).is_err() {
            if let Err(e) = fs::copy(file, destination) {
                let _ = fs::remove_file(destination);
                return Err(Error::Workspace(format!(
                    "failed to copy output to destination: {e}"
                )));
            }
            let _ = fs::remove_file(file);
        }

        tracing::debug!("Moved {} to {}", file.display(), destination.display());
        Ok(destination.to_path_buf())
    }
}

/// Whether `path` is already in the intermediate format (by extension,
/// case-insensitively).
pub fn is_intermediate(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(INTERMEDIATE_EXTENSION))
        .unwrap_or(false)
}
