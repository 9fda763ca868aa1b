//! Cut sheets: TOML descriptions of tracks built from clips.
//!
//! ```toml
//! output = "out.mp3"
//!
//! [[track]]
//! fill = 30.0
//!
//! [[track.clip]]
//! source = "drums.mp3"
//! start = 0.0
//! length = 6.0
//!
//! [[track.clip]]
//! source = "drums.mp3"
//! length = 2.0
//! reverse = true
//! ```

use crate::Result;
use anyhow::Context;
use cutlist_edit::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CutSheet {
    /// Destination used when none is given on the command line
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default, rename = "track")]
    pub tracks: Vec<TrackSheet>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackSheet {
    #[serde(default, rename = "clip")]
    pub clips: Vec<ClipSheet>,

    /// Repeat or cut the whole track to exactly this many seconds
    #[serde(default)]
    pub fill: Option<f64>,

    /// Play the whole track backwards
    #[serde(default)]
    pub reverse: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClipSheet {
    pub source: PathBuf,

    #[serde(default)]
    pub start: f64,

    /// Defaults to the rest of the source
    #[serde(default)]
    pub length: Option<f64>,

    #[serde(default)]
    pub reverse: bool,

    #[serde(default = "default_repeat")]
    pub repeat: usize,
}

fn default_repeat() -> usize {
    1
}

impl CutSheet {
    /// Parse a cut sheet, resolving relative sources and output against the
    /// sheet's directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cut sheet: {:?}", path))?;
        let mut sheet: CutSheet = toml::from_str(&content)
            .with_context(|| format!("Failed to parse cut sheet: {:?}", path))?;

        if let Some(base) = path.parent() {
            sheet.rebase(base);
        }
        Ok(sheet)
    }

    fn rebase(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        if let Some(output) = self.output.as_mut() {
            rebase(output);
        }
        for clip in self.tracks.iter_mut().flat_map(|t| t.clips.iter_mut()) {
            rebase(&mut clip.source);
        }
    }

    /// Build one edit list per track. `probe` is asked for each distinct
    /// source's duration once.
    pub fn build<F>(&self, mut probe: F) -> Result<Vec<Chunk>>
    where
        F: FnMut(&Path) -> Result<f64>,
    {
        let mut durations: HashMap<&Path, f64> = HashMap::new();
        let mut tracks = Vec::with_capacity(self.tracks.len());

        for track in &self.tracks {
            let mut chunk = Chunk::new();
            for clip in &track.clips {
                let duration = match durations.get(clip.source.as_path()) {
                    Some(duration) => *duration,
                    None => {
                        let duration = probe(&clip.source)?;
                        durations.insert(clip.source.as_path(), duration);
                        duration
                    }
                };
                chunk += &clip.build(duration)?;
            }

            if track.reverse {
                chunk = chunk.reverse();
            }
            if let Some(target) = track.fill {
                chunk = chunk.fill(target)?;
            }
            tracks.push(chunk);
        }

        Ok(tracks)
    }
}

impl ClipSheet {
    fn build(&self, source_duration: f64) -> Result<Chunk> {
        let whole = Chunk::from_source(&self.source, source_duration)?;
        let length = self
            .length
            .unwrap_or_else(|| (source_duration - self.start).max(0.0));

        let mut clip = whole.slice(self.start, length)?;
        if self.reverse {
            clip = clip.reverse();
        }
        Ok(clip.repeat(self.repeat))
    }
}
