//! Collector for warnings reported while a parse keeps going.
//!
//! Fatal problems stop the parse immediately, so the
//! [`DiagnosticCollector`] only ever holds recoverable diagnostics: the link
//! failures that drop a single transition or sync reference.

use log::warn;

use crate::error::Diagnostic;

/// Accumulates warnings in the order they were reported.
///
/// # Example
///
/// ```text
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(
///     Diagnostic::warning("destination `Run` not found")
///         .with_code(ErrorCode::E202)
///         .with_position(Position::new(4, 10)),
/// );
///
/// let warnings = collector.into_diagnostics();
/// assert_eq!(warnings.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        warn!(
            code:? = diagnostic.code(),
            position:? = diagnostic.position();
            "{}", diagnostic.message()
        );
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection, yielding every diagnostic in report order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
