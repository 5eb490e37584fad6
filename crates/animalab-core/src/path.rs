//! Scope paths.
//!
//! A [`Path`] names a state or state machine by the chain of scope names that
//! leads to it, starting with the layer's root state machine. Paths are the
//! symbol-table key used while a document is being parsed, and their
//! slash-separated form is the reference syntax of `goto` targets.

use std::fmt;

use thiserror::Error;

/// Error returned when a path operation walks above the root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot remove {requested} segment(s) from a path of depth {depth}")]
pub struct PathError {
    requested: usize,
    depth: usize,
}

/// An immutable, ordered sequence of name segments.
///
/// Equality and hashing are structural: two paths are equal when they hold the
/// same segments in the same order.
///
/// # Examples
///
/// ```
/// # use animalab_core::Path;
/// let root = Path::from_segments(["Base"]);
/// let state = root.join("Idle");
/// assert_eq!(state.to_string(), "Base/Idle");
/// assert_eq!(state.parent(), Some(root));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The empty (depth 0) path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment, if any.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a new path with every segment of `other` appended.
    pub fn concat(&self, other: &Path) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Removes the last `count` segments.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when `count` exceeds the depth of the path.
    pub fn up(&self, count: usize) -> Result<Self, PathError> {
        let depth = self.depth();
        if count > depth {
            return Err(PathError {
                requested: count,
                depth,
            });
        }
        Ok(Self {
            segments: self.segments[..depth - count].to_vec(),
        })
    }

    /// The path without its last segment, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.up(1).ok().filter(|_| !self.is_root())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_segments(iter)
    }
}
