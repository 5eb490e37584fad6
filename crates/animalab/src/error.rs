//! Error types for Animalab operations.
//!
//! [`AnimalabError`] wraps everything that can fail while compiling a
//! document. Link problems are not errors; they come back as warnings next to
//! the parsed controller.

use std::io;

use thiserror::Error;

use animalab_parser::ParseError;

/// The main error type for Animalab operations.
///
/// The `Parse` variant keeps the document text so the error can be shown
/// against its source.
#[derive(Debug, Error)]
pub enum AnimalabError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnimalabError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
