//! # cutlist-edit
//!
//! Non-destructive audio edit lists.
//!
//! A [`Fragment`] names a time range of one source file; a [`Chunk`] is an
//! ordered list of fragments forming a virtual timeline. Slicing, joining,
//! looping, splitting, filling, replacing and reversing all work on these
//! references alone; no audio is read or written here. Rendering a chunk to a
//! playable file is done by the `cutlist` crate.
//!
//! ## Example
//!
//! ```
//! use cutlist_edit::Chunk;
//!
//! let song = Chunk::from_source("song.mp3", 178.183)?;
//! let intro = song.slice(0.0, 6.0)? + &song.slice(0.0, 2.0)?;
//! let bed = intro.fill(15.0)?;
//!
//! assert_eq!(bed.duration(), 15.0);
//! assert_eq!(bed.fragments().len(), 4);
//! # Ok::<(), cutlist_edit::Error>(())
//! ```

mod chunk;
mod error;
mod fragment;

pub use chunk::{Chunk, DURATION_EPSILON};
pub use error::{Error, Result};
pub use fragment::Fragment;
