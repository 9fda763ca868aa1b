//! A single reference into a source audio file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An immutable reference to `[start, start + duration)` of a source file.
///
/// Fragments never change after construction. Reversal and clipping return
/// new fragments with the same source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFragment")]
pub struct Fragment {
    source: PathBuf,
    start: f64,
    duration: f64,
    reversed: bool,
}

/// Unvalidated wire form, checked through [`Fragment::new`] on deserialize.
#[derive(Deserialize)]
struct RawFragment {
    source: PathBuf,
    start: f64,
    duration: f64,
    #[serde(default)]
    reversed: bool,
}

impl TryFrom<RawFragment> for Fragment {
    type Error = Error;

    fn try_from(raw: RawFragment) -> Result<Self> {
        Fragment::new(raw.source, raw.start, raw.duration, raw.reversed)
    }
}

impl Fragment {
    /// Create a fragment, checking that `start >= 0` and `duration > 0`.
    pub fn new(
        source: impl Into<PathBuf>,
        start: f64,
        duration: f64,
        reversed: bool,
    ) -> Result<Self> {
        if !start.is_finite() || start < 0.0 {
            return Err(Error::invalid_fragment(format!(
                "start must be a non-negative number, got {start}"
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::invalid_fragment(format!(
                "duration must be positive, got {duration}"
            )));
        }

        Ok(Self {
            source: source.into(),
            start,
            duration,
            reversed,
        })
    }

    /// The source file this fragment reads from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Offset into the source, in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Offset of the end of the range within the source.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether the range plays backwards.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Same range with the orientation flipped.
    pub fn reversed(&self) -> Self {
        Self {
            reversed: !self.reversed,
            ..self.clone()
        }
    }

    /// Sub-range `[offset, offset + length)` measured from this fragment's own
    /// start. Orientation is preserved.
    ///
    /// Returns `None` when the clipped length is not positive.
    pub fn clip(&self, offset: f64, length: f64) -> Option<Self> {
        if length <= 0.0 {
            return None;
        }

        Some(Self {
            source: self.source.clone(),
            start: self.start + offset,
            duration: length,
            reversed: self.reversed,
        })
    }
}
