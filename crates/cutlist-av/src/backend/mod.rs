//! External tool backends.
//!
//! Rendering needs two kinds of external work: single-file conversion (decode,
//! normalize, encode) and multi-input placement/mixing. [`Transcoder`] and
//! [`Mixer`] describe those seams; [`Ffmpeg`] implements both and
//! [`Ecasound`] implements mixing with the classic ecasound chain syntax.

mod ecasound;
mod ffmpeg;

pub use ecasound::{Ecasound, ECASOUND_MAX_INPUTS};
pub use ffmpeg::{Ffmpeg, FFMPEG_MAX_INPUTS};

use crate::tools::Tool;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which tool places fragments and mixes tracks. Conversion and probing always
/// go through ffmpeg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ffmpeg,
    Ecasound,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Ffmpeg, BackendKind::Ecasound];

    /// Tools that must be installed to render with this backend.
    pub fn required_tools(self) -> &'static [Tool] {
        match self {
            BackendKind::Ffmpeg => &[Tool::Ffmpeg, Tool::Ffprobe],
            BackendKind::Ecasound => &[Tool::Ffmpeg, Tool::Ffprobe, Tool::Ecasound],
        }
    }
}

/// One extraction directive inside a batch: take `[start, start + duration)`
/// of `input`, optionally reversed, and put it at `offset` seconds of the
/// output timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Position of the fragment in the whole edit list.
    pub index: usize,
    /// Intermediate-format file to read from.
    pub input: PathBuf,
    pub start: f64,
    pub duration: f64,
    pub reversed: bool,
    /// Cumulative timeline position of this fragment.
    pub offset: f64,
}

impl Placement {
    /// Timeline position right after this placement.
    pub fn end_offset(&self) -> f64 {
        self.offset + self.duration
    }
}

/// Single input to single output conversion, plus duration probing.
pub trait Transcoder: Send + Sync {
    /// Convert `input` to `output`, the format following the output extension.
    /// `bitrate` applies to lossy targets only.
    fn convert(&self, input: &Path, output: &Path, bitrate: Option<&str>) -> Result<()>;

    /// Duration of an audio file in seconds.
    fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Write `seconds` of digital silence to `output`.
    fn generate_silence(&self, output: &Path, seconds: f64) -> Result<()>;
}

/// Multi-input extraction and mixing.
pub trait Mixer: Send + Sync {
    /// Most fragment inputs a single [`Mixer::place`] call accepts.
    fn max_inputs(&self) -> usize;

    /// Run one batch: write every placement into `timeline`, extending what
    /// earlier batches already wrote there.
    fn place(&self, placements: &[Placement], timeline: &Path) -> Result<()>;

    /// Combine whole files, overlaid from time zero, into `output`.
    fn mix(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// Seconds formatted for tool arguments.
pub(crate) fn seconds(value: f64) -> String {
    format!("{value}")
}
