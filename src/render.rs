//! Render pipeline: turns an edit list into a playable file.
//!
//! Rendering runs in four steps inside a scoped [`Workspace`]:
//!
//! 1. Every distinct source not already in the intermediate format is
//!    converted once, into a cache file named by the hash of its path.
//! 2. Fragments become [`Placement`]s carrying their cumulative timeline
//!    offset, grouped into batches no larger than the mixer's input ceiling.
//! 3. Batches run in order, each extending the same timeline file.
//! 4. The timeline is transcoded when the destination is not in the
//!    intermediate format, probed while still inside the workspace, and only
//!    then moved to the destination.
//!
//! The destination is only written once everything before it succeeded, and
//! the workspace is removed on every exit path.

use crate::config::{BackendKind, Config, RenderConfig, DEFAULT_BITRATE};
use crate::{EditError, Error, Result};
use cutlist_av::{is_intermediate, Ecasound, Ffmpeg, Mixer, Placement, Transcoder, Workspace};
use cutlist_edit::Chunk;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Options for a single render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Replace an existing destination.
    pub overwrite: bool,
    /// Bitrate for lossy destinations.
    pub bitrate: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            bitrate: DEFAULT_BITRATE.to_string(),
        }
    }
}

impl RenderOptions {
    /// Default options with overwriting enabled.
    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            ..Self::default()
        }
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            overwrite: config.overwrite,
            bitrate: config.bitrate.clone(),
        }
    }
}

/// Drives the external tools that materialize edit lists.
#[derive(Clone)]
pub struct Renderer {
    transcoder: Arc<dyn Transcoder>,
    mixer: Arc<dyn Mixer>,
    max_inputs: usize,
}

impl Renderer {
    /// Create a renderer using the mixer's own input ceiling.
    pub fn new(transcoder: Arc<dyn Transcoder>, mixer: Arc<dyn Mixer>) -> Self {
        let max_inputs = mixer.max_inputs().max(1);
        Self {
            transcoder,
            mixer,
            max_inputs,
        }
    }

    /// Locate the configured tools and build a renderer over them.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.tools.timeout_secs);
        let ffmpeg = Arc::new(
            Ffmpeg::locate(
                config.tools.ffmpeg_path.as_deref(),
                config.tools.ffprobe_path.as_deref(),
            )?
            .with_timeout(timeout),
        );

        let mixer: Arc<dyn Mixer> = match config.render.backend {
            BackendKind::Ffmpeg => ffmpeg.clone(),
            BackendKind::Ecasound => Arc::new(
                Ecasound::locate(config.tools.ecasound_path.as_deref())?.with_timeout(timeout),
            ),
        };

        let renderer = Self::new(ffmpeg, mixer);
        Ok(match config.render.max_inputs {
            Some(max_inputs) => renderer.with_max_inputs(max_inputs),
            None => renderer,
        })
    }

    /// Cap the number of fragments per mixer invocation below the backend's.
    pub fn with_max_inputs(mut self, max_inputs: usize) -> Self {
        self.max_inputs = max_inputs.max(1);
        self
    }

    pub fn max_inputs(&self) -> usize {
        self.max_inputs
    }

    /// Duration of an audio file in seconds.
    pub fn probe_duration(&self, path: &Path) -> Result<f64> {
        Ok(self.transcoder.probe_duration(path)?)
    }

    /// Wrap a whole source file as a single-fragment edit list.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Chunk> {
        let path = path.as_ref();
        let duration = self.probe_duration(path)?;
        Ok(Chunk::from_source(path, duration)?)
    }

    /// Render `chunk` to `destination` and return an edit list over the
    /// rendered file.
    ///
    /// # Errors
    ///
    /// - [`EditError::EmptyFragment`] if the chunk is empty, before any
    ///   external invocation.
    /// - [`cutlist_av::Error::FileExists`] if the destination exists and
    ///   `options.overwrite` is false.
    /// - [`cutlist_av::Error::CommandFailed`] if any tool invocation fails.
    pub fn render(
        &self,
        chunk: &Chunk,
        destination: impl AsRef<Path>,
        options: &RenderOptions,
    ) -> Result<Chunk> {
        let destination = destination.as_ref();
        if chunk.is_empty() {
            return Err(EditError::EmptyFragment.into());
        }
        check_destination(destination, options.overwrite)?;

        let span = tracing::info_span!(
            "render",
            destination = %destination.display(),
            fragments = chunk.len()
        );
        let _guard = span.enter();

        let workspace = Workspace::new()?;
        let timeline = workspace.temp_file("timeline.wav");
        self.render_timeline(chunk, &workspace, &timeline)?;
        let rendered = self.deliver(&workspace, &timeline, destination, options)?;

        tracing::info!(
            "Rendered {:.3}s in {} fragments to {}",
            chunk.duration(),
            chunk.len(),
            destination.display()
        );
        Ok(rendered)
    }

    /// Render, replacing the destination if it exists.
    pub fn render_overwrite(&self, chunk: &Chunk, destination: impl AsRef<Path>) -> Result<Chunk> {
        self.render(chunk, destination, &RenderOptions::overwrite())
    }

    /// Write one second of silence to `destination` and return it filled to
    /// `duration`.
    pub fn silence(&self, destination: impl AsRef<Path>, duration: f64) -> Result<Chunk> {
        let destination = destination.as_ref();
        let extension = check_destination(destination, false)?;

        let workspace = Workspace::new()?;
        let generated = workspace.temp_file(&format!("silence.{extension}"));
        self.transcoder.generate_silence(&generated, 1.0)?;
        let generated_duration = self.probe_duration(&generated)?;
        workspace.finalize(&generated, destination, false)?;

        let source = Chunk::from_source(destination, generated_duration)?;
        let second = source.slice(0.0, generated_duration.min(1.0))?;
        Ok(second.fill(duration)?)
    }

    /// Build the timeline for `chunk` at `timeline`, converting sources into
    /// the workspace's cache as needed.
    pub(crate) fn render_timeline(
        &self,
        chunk: &Chunk,
        workspace: &Workspace,
        timeline: &Path,
    ) -> Result<()> {
        let resolved = self.resolve_sources(chunk, workspace)?;
        let batches = plan_batches(chunk, &resolved, self.max_inputs);

        for (i, batch) in batches.iter().enumerate() {
            tracing::debug!(
                "Batch {}/{}: {} fragments at {:.3}s",
                i + 1,
                batches.len(),
                batch.len(),
                batch.first().map(|p| p.offset).unwrap_or_default()
            );
            self.mixer.place(batch, timeline)?;
        }

        Ok(())
    }

    /// Map every source to a file the mixer can read directly.
    fn resolve_sources(
        &self,
        chunk: &Chunk,
        workspace: &Workspace,
    ) -> Result<HashMap<PathBuf, PathBuf>> {
        let mut resolved = HashMap::new();
        let mut pending = Vec::new();

        for fragment in chunk {
            let source = fragment.source();
            if resolved.contains_key(source) {
                continue;
            }

            let target = if is_intermediate(source) {
                source.to_path_buf()
            } else {
                let cached = workspace.cache_file(source);
                if !cached.exists() {
                    pending.push((source.to_path_buf(), cached.clone()));
                }
                cached
            };
            resolved.insert(source.to_path_buf(), target);
        }

        pending
            .par_iter()
            .try_for_each(|(source, cached)| {
                tracing::debug!("Converting {} to intermediate format", source.display());
                self.transcoder.convert(source, cached, None)
            })?;

        Ok(resolved)
    }

    /// Transcode a finished timeline if needed, probe it inside the workspace
    /// and move it into place. Returns an edit list over the destination.
    pub(crate) fn deliver(
        &self,
        workspace: &Workspace,
        timeline: &Path,
        destination: &Path,
        options: &RenderOptions,
    ) -> Result<Chunk> {
        let finished = if is_intermediate(destination) {
            timeline.to_path_buf()
        } else {
            let encoded = workspace.temp_file(&format!("encoded.{}", extension(destination)?));
            self.transcoder
                .convert(timeline, &encoded, Some(&options.bitrate))?;
            encoded
        };

        let duration = self.probe_duration(&finished)?;
        workspace.finalize(&finished, destination, options.overwrite)?;
        Ok(Chunk::from_source(destination, duration)?)
    }

    pub(crate) fn mixer(&self) -> &dyn Mixer {
        self.mixer.as_ref()
    }
}

/// Fail early if the destination cannot be written; returns its extension.
pub(crate) fn check_destination(destination: &Path, overwrite: bool) -> Result<String> {
    if destination.exists() && !overwrite {
        return Err(cutlist_av::Error::file_exists(destination).into());
    }
    extension(destination)
}

/// Lowercased extension that selects the output format.
fn extension(destination: &Path) -> Result<String> {
    destination
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| {
            Error::config(format!(
                "cannot infer output format of {}: no file extension",
                destination.display()
            ))
        })
}

/// Turn an edit list into ordered batches of placements.
///
/// Offsets depend only on fragment order: each placement starts where the
/// previous one ended, across batch boundaries too. Sources missing from
/// `resolved` are read as-is.
pub fn plan_batches(
    chunk: &Chunk,
    resolved: &HashMap<PathBuf, PathBuf>,
    max_inputs: usize,
) -> Vec<Vec<Placement>> {
    let mut position = 0.0;
    let placements: Vec<Placement> = chunk
        .fragments()
        .iter()
        .enumerate()
        .map(|(index, fragment)| {
            let placement = Placement {
                index,
                input: resolved
                    .get(fragment.source())
                    .cloned()
                    .unwrap_or_else(|| fragment.source().to_path_buf()),
                start: fragment.start(),
                duration: fragment.duration(),
                reversed: fragment.is_reversed(),
                offset: position,
            };
            position += fragment.duration();
            placement
        })
        .collect();

    placements
        .chunks(max_inputs.max(1))
        .map(<[Placement]>::to_vec)
        .collect()
}
