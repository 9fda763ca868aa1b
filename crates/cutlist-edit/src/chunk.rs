//! The edit list and its algebra.
//!
//! A [`Chunk`] is an ordered sequence of [`Fragment`]s. Every edit returns a
//! fresh chunk built from clipped or re-oriented fragments; only
//! [`Chunk::add_fragment`], [`Chunk::append`] and [`Chunk::repeat_in_place`]
//! change a chunk in place.

use crate::{Error, Fragment, Result};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::path::PathBuf;

/// Tolerance, in seconds, applied to range checks and to the leftovers of
/// floating-point subtraction.
pub const DURATION_EPSILON: f64 = 1e-9;

/// An ordered edit list describing a virtual timeline.
///
/// # Example
///
/// ```
/// use cutlist_edit::Chunk;
///
/// let song = Chunk::from_source("song.mp3", 178.183)?;
/// let edited = song.slice(0.0, 120.0)? + &song.slice(150.0, 20.0)?;
///
/// assert_eq!(edited.duration(), 140.0);
/// assert_eq!(edited.fragments().len(), 2);
/// # Ok::<(), cutlist_edit::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chunk {
    fragments: Vec<Fragment>,
}

impl Chunk {
    /// Create an empty edit list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit list with one fragment spanning a whole source of known duration.
    pub fn from_source(source: impl Into<PathBuf>, duration: f64) -> Result<Self> {
        Ok(Self {
            fragments: vec![Fragment::new(source, 0.0, duration, false)?],
        })
    }

    /// Edit list over the given fragments, in playback order.
    pub fn from_fragments(fragments: impl IntoIterator<Item = Fragment>) -> Self {
        Self {
            fragments: fragments.into_iter().collect(),
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Total timeline length in seconds.
    pub fn duration(&self) -> f64 {
        self.fragments.iter().map(Fragment::duration).sum()
    }

    /// Append one fragment in place.
    pub fn add_fragment(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// Append all of `other`'s fragments in place.
    pub fn append(&mut self, other: &Chunk) {
        self.fragments.extend_from_slice(&other.fragments);
    }

    /// Repeat the current sequence `count` times in place. A count of zero
    /// clears the chunk.
    pub fn repeat_in_place(&mut self, count: usize) {
        if count == 0 {
            self.fragments.clear();
            return;
        }

        let original = self.fragments.clone();
        self.fragments.reserve(original.len() * (count - 1));
        for _ in 1..count {
            self.fragments.extend_from_slice(&original);
        }
    }

    /// The part of the timeline covering `[start, start + length)`.
    ///
    /// Fragments are clipped at the range boundaries, each relative to its own
    /// source offset, and keep their orientation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfDuration`] if the range ends past the timeline.
    pub fn slice(&self, start: f64, length: f64) -> Result<Chunk> {
        check_non_negative(start)?;
        check_non_negative(length)?;

        let duration = self.duration();
        if start + length > duration + DURATION_EPSILON {
            return Err(Error::out_of_duration(start, length, duration));
        }

        let mut sliced = Chunk::new();
        let mut offset = start;
        let mut remain = length;

        for fragment in &self.fragments {
            if remain <= DURATION_EPSILON {
                break;
            }

            if offset >= fragment.duration() - DURATION_EPSILON {
                offset = (offset - fragment.duration()).max(0.0);
                continue;
            }

            let take = remain.min(fragment.duration() - offset);
            if let Some(piece) = fragment.clip(offset, take) {
                sliced.add_fragment(piece);
            }

            remain -= take;
            offset = 0.0;
        }

        Ok(sliced)
    }

    /// A new chunk with `other` played after this one.
    pub fn concat(&self, other: &Chunk) -> Chunk {
        let mut joined = self.clone();
        joined.append(other);
        joined
    }

    /// A new chunk playing this one `count` times back to back.
    pub fn repeat(&self, count: usize) -> Chunk {
        let mut repeated = self.clone();
        repeated.repeat_in_place(count);
        repeated
    }

    /// Cut the timeline into `count` consecutive pieces of equal duration.
    ///
    /// The final piece runs to the exact end of the timeline, so the piece
    /// durations always add up to [`Chunk::duration`].
    pub fn split(&self, count: usize) -> Result<Vec<Chunk>> {
        if count == 0 {
            return Err(Error::InvalidCount);
        }
        if self.is_empty() {
            return Err(Error::EmptyFragment);
        }

        let duration = self.duration();
        let width = duration / count as f64;

        (0..count)
            .map(|i| {
                let start = i as f64 * width;
                let length = if i + 1 == count {
                    (duration - start).max(0.0)
                } else {
                    width
                };
                self.slice(start, length)
            })
            .collect()
    }

    /// Repeat this chunk until it lasts exactly `target` seconds, cutting the
    /// last repetition short as needed.
    pub fn fill(&self, target: f64) -> Result<Chunk> {
        if self.is_empty() {
            return Err(Error::EmptyFragment);
        }
        if !target.is_finite() || target < 0.0 {
            return Err(Error::InvalidDuration(target));
        }

        let duration = self.duration();
        let mut filled = Chunk::new();
        let mut remain = target;

        while remain > DURATION_EPSILON {
            if remain < duration {
                filled.append(&self.slice(0.0, remain)?);
                break;
            }

            filled.append(self);
            remain -= duration;
        }

        Ok(filled)
    }

    /// Swap `[start, start + length)` for `replacement`.
    ///
    /// Zero-length head or tail pieces are left out.
    pub fn replace(&self, start: f64, length: f64, replacement: &Chunk) -> Result<Chunk> {
        check_non_negative(start)?;
        check_non_negative(length)?;

        let duration = self.duration();
        let offset = start + length;
        if offset > duration + DURATION_EPSILON {
            return Err(Error::out_of_duration(start, length, duration));
        }

        let mut replaced = Chunk::new();
        if start > DURATION_EPSILON {
            replaced.append(&self.slice(0.0, start)?);
        }

        replaced.append(replacement);

        let tail = duration - offset;
        if tail > DURATION_EPSILON {
            replaced.append(&self.slice(offset, tail)?);
        }

        Ok(replaced)
    }

    /// Play the timeline backwards: fragment order is reversed and every
    /// fragment's orientation is flipped.
    pub fn reverse(&self) -> Chunk {
        self.fragments.iter().rev().map(Fragment::reversed).collect()
    }
}

fn check_non_negative(value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidDuration(value))
    }
}

impl Add<&Chunk> for Chunk {
    type Output = Chunk;

    fn add(mut self, rhs: &Chunk) -> Chunk {
        self.append(rhs);
        self
    }
}

impl Add<Chunk> for Chunk {
    type Output = Chunk;

    fn add(mut self, rhs: Chunk) -> Chunk {
        self.fragments.extend(rhs.fragments);
        self
    }
}

impl Add<&Chunk> for &Chunk {
    type Output = Chunk;

    fn add(self, rhs: &Chunk) -> Chunk {
        self.concat(rhs)
    }
}

impl AddAssign<&Chunk> for Chunk {
    fn add_assign(&mut self, rhs: &Chunk) {
        self.append(rhs);
    }
}

impl Mul<usize> for Chunk {
    type Output = Chunk;

    fn mul(mut self, count: usize) -> Chunk {
        self.repeat_in_place(count);
        self
    }
}

impl Mul<usize> for &Chunk {
    type Output = Chunk;

    fn mul(self, count: usize) -> Chunk {
        self.repeat(count)
    }
}

impl Sum for Chunk {
    fn sum<I: Iterator<Item = Chunk>>(iter: I) -> Chunk {
        iter.fold(Chunk::new(), |acc, chunk| acc + chunk)
    }
}

impl FromIterator<Fragment> for Chunk {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self::from_fragments(iter)
    }
}

impl Extend<Fragment> for Chunk {
    fn extend<I: IntoIterator<Item = Fragment>>(&mut self, iter: I) {
        self.fragments.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Chunk {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}
