//! Error and diagnostic system for the Animalab parser.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Labeled spans and row/column positions
//! - Severity levels, so link problems can be reported as warnings
//! - A collector for accumulating warnings during a parse
//!
//! # Overview
//!
//! A [`Diagnostic`] is a single error or warning. Fatal diagnostics end the
//! parse and are returned wrapped in a [`ParseError`], which always knows the
//! row and column of the failure. Warnings are collected and handed back with
//! the partially linked graph.
//!
//! # Example
//!
//! ```
//! # use animalab_parser::error::{Diagnostic, ErrorCode};
//! # use animalab_parser::{Position, Span};
//! let diag = Diagnostic::error("unexpected symbol `}`")
//!     .with_code(ErrorCode::E100)
//!     .with_label(Span::new(40..41), "not expected here")
//!     .with_position(Position::new(3, 2))
//!     .with_help("a state body must be opened with `{` first");
//! assert_eq!(diag.to_string(), "error[E100]: unexpected symbol `}`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
