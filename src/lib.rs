//! Cutlist - non-destructive audio edit lists
//!
//! Build timelines from references into source files with
//! [`cutlist_edit::Chunk`], then materialize them with a [`Renderer`]
//! (one timeline) or a [`TrackMixer`] (several overlaid timelines).
//!
//! ```no_run
//! use cutlist::{config::Config, RenderOptions, Renderer};
//!
//! let renderer = Renderer::from_config(&Config::default())?;
//! let song = renderer.open("song.mp3")?;
//! let edit = song.slice(0.0, 120.0)? + &song.slice(150.0, 20.0)?;
//!
//! let rendered = renderer.render(&edit, "out.mp3", &RenderOptions::default())?;
//! assert!((rendered.duration() - 140.0).abs() < 0.1);
//! # Ok::<(), cutlist::Error>(())
//! ```

pub mod config;
mod error;
pub mod mixer;
pub mod render;
pub mod sheet;

pub use cutlist_edit::{Chunk, Fragment};
pub use error::{AvError, EditError, Error, Result};
pub use mixer::TrackMixer;
pub use render::{plan_batches, RenderOptions, Renderer};
pub use sheet::CutSheet;
