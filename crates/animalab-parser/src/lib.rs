//! # Animalab Parser
//!
//! Parser for the Animalab animation state-machine language. This crate
//! turns document text into a [`Controller`] graph:
//!
//! 1. **Lex** - [`lexer::tokenize`] produces a lazy stream of tokens
//! 2. **Parse** - the [`stack::StackParser`] drives the grammar rules,
//!    which create graph nodes as they go
//! 3. **Link** - every state machine resolves its transitions by path as
//!    it closes
//!
//! Everything outside the graph (assets, persistence, behaviour schemas)
//! is reached through the [`Host`] trait.
//!
//! ## Usage
//!
//! ```
//! # use animalab_core::{behaviour::{Schema, TypeHandle}, resource::{AssetRef, ResourceKind}};
//! # use animalab_parser::{Host, ObjectRef, ParseError, parse};
//! struct NoAssets;
//!
//! impl Host for NoAssets {
//!     fn resolve_resource(&mut self, _: &str, _: ResourceKind) -> Option<AssetRef> { None }
//!     fn persist(&mut self, _: ObjectRef, _: &str) {}
//!     fn resolve_behaviour_type(&self, _: &str) -> Option<TypeHandle> { None }
//!     fn introspect_schema(&self, _: TypeHandle) -> Option<&Schema> { None }
//!     fn warn(&mut self, _: &str) {}
//! }
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         float speed;
//!         layer Base {
//!             default Idle;
//!             state Idle { if speed > 0.1 goto Run; }
//!             state Run { if speed < 0.1 goto Idle; }
//!         }
//!     "#;
//!
//!     let output = parse(source, "Hero", &mut NoAssets)?;
//!     assert_eq!(output.controller.layers().len(), 1);
//!     assert!(output.warnings.is_empty());
//!     Ok(())
//! }
//! ```

pub mod error;
mod grammar;
mod host;
pub mod lexer;
mod linker;
#[cfg(test)]
mod parser_tests;
mod span;
pub mod stack;
pub mod tokens;

pub use error::{Diagnostic, ParseError};
pub use host::{Host, ObjectRef};
pub use span::{Position, Span};

use log::info;

use animalab_core::Controller;

use grammar::{DocumentRule, Session};
use stack::StackParser;
use tokens::SymbolSet;

/// A parsed and linked controller with the warnings raised while linking.
#[derive(Debug)]
pub struct ParseOutput {
    pub controller: Controller,
    /// Non-fatal problems, in the order they were found.
    pub warnings: Vec<Diagnostic>,
}

/// Parse a document into a controller named `name`.
///
/// Objects are persisted to `host` as soon as they are created, so a failed
/// parse may still have persisted part of the graph.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the row and column of the first fatal
/// problem: a lexical error, an unexpected token, an unknown behaviour type
/// or field, or an invalid value.
pub fn parse(source: &str, name: &str, host: &mut dyn Host) -> Result<ParseOutput, ParseError> {
    info!(controller = name; "Parsing document");
    let mut session = Session::new(Controller::new(name), host);
    StackParser::new(SymbolSet::DOCUMENT).parse(DocumentRule::new(), source, &mut session)?;
    let (controller, warnings) = session.finish();
    info!(controller = name, warnings = warnings.len(); "Document parsed");
    Ok(ParseOutput {
        controller,
        warnings,
    })
}
