//! Multi-track mixing.

use crate::render::{check_destination, RenderOptions, Renderer};
use crate::{EditError, Result};
use cutlist_av::Workspace;
use cutlist_edit::Chunk;
use std::path::Path;

/// Renders several edit lists and overlays them into one file.
///
/// All tracks share one workspace, so a source used on several tracks is
/// converted only once.
#[derive(Clone)]
pub struct TrackMixer {
    renderer: Renderer,
    tracks: Vec<Chunk>,
}

impl TrackMixer {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            tracks: Vec::new(),
        }
    }

    /// Append a track.
    pub fn add_track(&mut self, chunk: Chunk) {
        self.tracks.push(chunk);
    }

    pub fn tracks(&self) -> &[Chunk] {
        &self.tracks
    }

    /// Render every track, mix them and write the result to `destination`.
    ///
    /// Empty tracks are skipped. With a single non-empty track the mix step is
    /// skipped as well.
    ///
    /// # Errors
    ///
    /// [`EditError::EmptyFragment`] if every track is empty; otherwise the same
    /// errors as [`Renderer::render`].
    pub fn render_to_file(
        &self,
        destination: impl AsRef<Path>,
        options: &RenderOptions,
    ) -> Result<Chunk> {
        let destination = destination.as_ref();
        if self.tracks.iter().all(Chunk::is_empty) {
            return Err(EditError::EmptyFragment.into());
        }
        check_destination(destination, options.overwrite)?;

        let span = tracing::info_span!(
            "mix",
            destination = %destination.display(),
            tracks = self.tracks.len()
        );
        let _guard = span.enter();

        let workspace = Workspace::new()?;
        let mut rendered = Vec::with_capacity(self.tracks.len());
        for (index, track) in self.tracks.iter().enumerate() {
            if track.is_empty() {
                tracing::debug!("Skipping empty track {}", index);
                continue;
            }
            let file = workspace.temp_file(&format!("track_{index}.wav"));
            self.renderer.render_timeline(track, &workspace, &file)?;
            rendered.push(file);
        }

        let mixed = if rendered.len() == 1 {
            rendered.remove(0)
        } else {
            let mixed = workspace.temp_file("mix.wav");
            self.renderer.mixer().mix(&rendered, &mixed)?;
            mixed
        };

        let rendered = self
            .renderer
            .deliver(&workspace, &mixed, destination, options)?;

        tracing::info!(
            "Mixed {} tracks to {}",
            self.tracks.len(),
            destination.display()
        );
        Ok(rendered)
    }
}
