//! Animalab - a textual language for animation state machines.
//!
//! Documents describe layers of nested state machines, their states and
//! motions, transitions with boolean conditions, typed parameters and
//! attached behaviour records. This crate ties the pieces together:
//! parsing into a [`Controller`] graph, writing a graph back as canonical
//! text, and placing graph nodes that have no position yet.

pub mod config;

mod error;
mod host;
mod layout;
mod unparse;

pub use animalab_core::{Controller, Path, behaviour, controller, geometry, motion, resource, transition};
pub use animalab_parser::{Diagnostic, Host, ObjectRef, ParseError, ParseOutput};

pub use error::AnimalabError;
pub use host::MemoryHost;
pub use layout::{
    ForceLayout, LayoutNode, LayoutReport, layout_all, layout_state_machine, layout_unplaced,
    spiral_position,
};
pub use unparse::unparse;

use log::{debug, info, trace};

use config::AppConfig;

/// Entry point for compiling documents to controllers and back.
///
/// # Examples
///
/// ```
/// use animalab::{Compiler, config::AppConfig};
///
/// let source = r#"
///     float speed;
///     layer Base {
///         default Idle;
///         state Idle { if speed > 0.1 goto Run; }
///         state Run { if speed < 0.1 goto Idle; }
///     }
/// "#;
///
/// let compiler = Compiler::new(AppConfig::default());
/// let output = compiler.parse(source, "Hero").expect("Failed to parse");
/// let text = compiler.unparse(&output.controller);
/// assert!(text.contains("if(speed > 0.1) goto Run;"));
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
}

impl Compiler {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a document with a [`MemoryHost`] built from the configuration,
    /// then lay out every state machine that has unplaced nodes.
    ///
    /// # Errors
    ///
    /// Returns [`AnimalabError::Config`] if the configured asset root is
    /// unusable and [`AnimalabError::Parse`] for fatal document errors.
    pub fn parse(&self, source: &str, name: &str) -> Result<ParseOutput, AnimalabError> {
        let mut host = MemoryHost::from_config(&self.config)?;
        self.parse_with_host(source, name, &mut host)
    }

    /// Parse a document against a caller-supplied host.
    ///
    /// # Errors
    ///
    /// Returns [`AnimalabError::Parse`] with the document text attached.
    pub fn parse_with_host(
        &self,
        source: &str,
        name: &str,
        host: &mut dyn Host,
    ) -> Result<ParseOutput, AnimalabError> {
        info!(controller = name; "Compiling document");
        let mut output = animalab_parser::parse(source, name, host)
            .map_err(|err| AnimalabError::new_parse_error(err, source))?;

        let placed = layout_unplaced(&mut output.controller, self.config.layout());
        debug!(placed, warnings = output.warnings.len(); "Document compiled");
        trace!(controller:? = output.controller; "Compiled controller");
        Ok(output)
    }

    /// Canonical document text for `controller`.
    pub fn unparse(&self, controller: &Controller) -> String {
        unparse(controller)
    }

    /// Re-runs the layout of every state machine. Returns the number of
    /// nodes that moved.
    pub fn layout(&self, controller: &mut Controller) -> usize {
        layout_all(controller, self.config.layout())
    }
}
