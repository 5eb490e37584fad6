//! The fatal error returned by a failed parse.
//!
//! [`ParseError`] wraps the [`Diagnostic`] that stopped the parse together
//! with the 0-based row and column it was raised at, so a host can jump to
//! the offending location.

use thiserror::Error;

use crate::{error::Diagnostic, span::Position};

/// A type alias for `Result<T, Diagnostic>`.
///
/// Grammar rules fail with a bare diagnostic; the stack parser adds the
/// position of the token being processed when the rule did not set one.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// A positioned, fatal parse failure.
#[derive(Debug, Error)]
#[error("{diagnostic} (at {position})")]
pub struct ParseError {
    diagnostic: Diagnostic,
    position: Position,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ParseError {
    /// Create a parse error at `position`.
    ///
    /// The diagnostic's own position wins when it already has one.
    pub fn new(diagnostic: Diagnostic, position: Position) -> Self {
        let position = diagnostic.position().unwrap_or(position);
        Self {
            diagnostic: diagnostic.with_position(position),
            position,
            source: None,
        }
    }

    /// Attach the lower-level error this failure was caused by.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// 0-based row of the failure.
    pub fn row(&self) -> usize {
        self.position.row()
    }

    /// 0-based column of the failure.
    pub fn col(&self) -> usize {
        self.position.col()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn message(&self) -> &str {
        self.diagnostic.message()
    }

    pub fn code(&self) -> Option<crate::error::ErrorCode> {
        self.diagnostic.code()
    }

    /// The diagnostic describing this failure.
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_error_takes_fallback_position() {
        let err = ParseError::new(
            Diagnostic::error("unexpected symbol `}`").with_code(ErrorCode::E100),
            Position::new(3, 7),
        );

        assert_eq!(err.row(), 3);
        assert_eq!(err.col(), 7);
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.diagnostic().position(), Some(Position::new(3, 7)));
        assert_eq!(
            err.to_string(),
            "error[E100]: unexpected symbol `}` (at 3:7)"
        );
    }

    #[test]
    fn test_parse_error_keeps_diagnostic_position() {
        let diag = Diagnostic::error("unterminated string literal")
            .with_code(ErrorCode::E001)
            .with_position(Position::new(0, 4));
        let err = ParseError::new(diag, Position::new(9, 9));

        assert_eq!(err.position(), Position::new(0, 4));
        assert_eq!(err.message(), "unterminated string literal");
    }

    #[test]
    fn test_parse_error_source() {
        let inner = "x".parse::<f32>().unwrap_err();
        let err = ParseError::new(Diagnostic::error("invalid number"), Position::default())
            .with_source(inner);

        assert!(err.source().is_some());
    }
}
