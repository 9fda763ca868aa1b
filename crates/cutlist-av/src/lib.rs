//! # cutlist-av
//!
//! External audio tool plumbing for cutlist.
//!
//! This crate provides functionality for:
//! - Locating ffmpeg, ffprobe and ecasound and reporting usable backends
//! - Running tool invocations with captured output and a timeout
//! - Scoped temporary workspaces with a content-addressed conversion cache
//! - Probing source durations
//! - The [`Transcoder`] and [`Mixer`] backends the render pipeline drives
//!
//! ## Example
//!
//! ```no_run
//! use cutlist_av::{Ffmpeg, Transcoder};
//! use std::path::Path;
//!
//! let ffmpeg = Ffmpeg::locate(None, None)?;
//! let seconds = ffmpeg.probe_duration(Path::new("/path/to/song.mp3"))?;
//! println!("Duration: {seconds:.3}s");
//! # Ok::<(), cutlist_av::Error>(())
//! ```

pub mod backend;
pub mod command;
mod error;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use backend::{BackendKind, Ecasound, Ffmpeg, Mixer, Placement, Transcoder};
pub use command::{ToolCommand, ToolOutput, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use tools::{available_backends, check_tool, check_tools, Tool, ToolInfo};
pub use workspace::{is_intermediate, Workspace, INTERMEDIATE_EXTENSION};
