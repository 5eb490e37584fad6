//! Source locations.
//!
//! Every token carries two views of where it came from: a byte [`Span`] into
//! the source text, used to render labelled diagnostics, and a row/column
//! [`Position`], the 0-based location hosts use to jump to an error.

use std::{fmt, ops::Range};

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn to_range(self) -> Range<usize> {
        self.start..self.end
    }
}

/// A 0-based row and column (in characters) in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// The position `count` characters further along the same row.
    pub fn advance(self, count: usize) -> Self {
        Self {
            row: self.row,
            col: self.col + count,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_union() {
        let a = Span::new(4..8);
        let b = Span::new(2..5);
        assert_eq!(a.union(b), Span::new(2..8));
        assert_eq!(a.len(), 4);
        assert!(Span::new(3..3).is_empty());
    }

    #[test]
    fn test_position_advance() {
        let position = Position::new(2, 5).advance(3);
        assert_eq!(position, Position::new(2, 8));
        assert_eq!(position.to_string(), "2:8");
    }
}
