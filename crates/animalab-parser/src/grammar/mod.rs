//! Grammar rules of the document language.
//!
//! Every production is a [`Rule`](crate::stack::Rule) over the [`Scope`]
//! snapshot and the shared [`Session`]. Rules create graph nodes as soon as
//! they know their names, so a child rule always finds its owner in the
//! controller.
//!
//! ```text
//! DocumentRule
//!  ├─ ParameterRule
//!  └─ StateMachineRule (layer)
//!      ├─ StateMachineRule (nested) ...
//!      ├─ StateRule
//!      │   ├─ MotionRule ──► MotionRule (blend tree children)
//!      │   ├─ ConditionRule
//!      │   └─ BehaviourRule
//!      ├─ ConditionRule
//!      └─ BehaviourRule
//! ```

mod behaviour;
mod condition;
mod document;
mod motion;
mod parameter;
mod state;
mod state_machine;
mod type_name;

use std::collections::{HashMap, HashSet};

use animalab_core::{
    Controller, Path,
    controller::{NodeRef, StateId, StateMachineId},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    host::{Host, ObjectRef},
    linker::{PendingTransition, SyncRequest},
    stack::{Control, TokenEvent},
};

pub(crate) use document::DocumentRule;

/// Control handle specialised to the document grammar.
type Ctl<'h> = Control<Scope, Session<'h>>;

/// What a rule knows about where it sits in the document.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    /// Names of the enclosing objects, used to build persistence names.
    pub hint: Vec<String>,
    pub layer: Option<usize>,
    pub state_machine: Option<StateMachineId>,
    pub state: Option<StateId>,
    /// Path of the innermost enclosing state machine.
    pub path: Path,
}

/// The nodes of one layer, addressed by path.
#[derive(Debug, Default)]
pub(crate) struct LayerSymbols {
    nodes: HashMap<Path, NodeRef>,
}

impl LayerSymbols {
    pub fn get(&self, path: &Path) -> Option<NodeRef> {
        self.nodes.get(path).copied()
    }
}

/// State shared by every rule of one parse.
pub(crate) struct Session<'h> {
    pub controller: Controller,
    pub host: &'h mut dyn Host,
    /// Symbol tables, indexed like the controller's layers.
    pub layers: Vec<LayerSymbols>,
    pub pending: Vec<PendingTransition>,
    pub sync_requests: Vec<SyncRequest>,
    used_names: HashSet<String>,
    warnings: DiagnosticCollector,
}

impl<'h> Session<'h> {
    pub fn new(controller: Controller, host: &'h mut dyn Host) -> Self {
        Self {
            controller,
            host,
            layers: Vec::new(),
            pending: Vec::new(),
            sync_requests: Vec::new(),
            used_names: HashSet::new(),
            warnings: DiagnosticCollector::new(),
        }
    }

    /// Hand `object` to the host under a name unique within this parse.
    ///
    /// The name is the hint path joined with `/` and the object's own name;
    /// clashes get a numeric suffix.
    pub fn persist(&mut self, hint: &[String], object: ObjectRef, name: &str) {
        let base = if name.is_empty() { object.label() } else { name };
        let full = if hint.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", hint.join("/"), base)
        };
        let mut unique = full.clone();
        let mut suffix = 0;
        while !self.used_names.insert(unique.clone()) {
            suffix += 1;
            unique = format!("{full}{suffix}");
        }
        self.host.persist(object, &unique);
    }

    /// Record a warning, log it and show it to the host.
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        self.host.warn(diagnostic.message());
        self.warnings.emit(diagnostic);
    }

    /// Open the symbol table of a newly added layer.
    pub fn open_layer(&mut self, layer: usize) {
        if self.layers.len() <= layer {
            self.layers.resize_with(layer + 1, LayerSymbols::default);
        }
    }

    /// Register a node of `layer` under `path`.
    ///
    /// The first node registered under a path keeps it.
    pub fn register(&mut self, layer: usize, path: Path, node: NodeRef, event: &TokenEvent) {
        self.open_layer(layer);
        let nodes = &mut self.layers[layer].nodes;
        if nodes.contains_key(&path) {
            let diagnostic = Diagnostic::warning(format!("duplicate node name `{path}`"))
                .with_code(ErrorCode::E205)
                .with_label(event.span(), "already declared in this scope")
                .with_position(event.position());
            self.warn(diagnostic);
            return;
        }
        nodes.insert(path, node);
    }

    pub fn lookup(&self, layer: usize, path: &Path) -> Option<NodeRef> {
        self.layers.get(layer).and_then(|symbols| symbols.get(path))
    }

    pub fn finish(self) -> (Controller, Vec<Diagnostic>) {
        (self.controller, self.warnings.into_diagnostics())
    }
}

/// The text of a token that can name something: an identifier or a string.
fn name_of(event: &TokenEvent) -> Option<&str> {
    event.kind().is_name().then(|| event.text())
}

/// A missing scope field means a rule was attached outside its parent.
fn out_of_scope(event: &TokenEvent, what: &str) -> Diagnostic {
    Diagnostic::error(format!("{what} is not allowed here"))
        .with_code(ErrorCode::E100)
        .with_label(event.span(), "outside of its enclosing block")
        .with_position(event.position())
}

/// Tokens that begin a transition statement.
const TRANSITION_KEYWORDS: &[&str] = &[
    "if",
    "noSelf",
    "any",
    "muted",
    "solo",
    "wait",
    "fade",
    "end",
    "goto",
    "none",
    "source",
    "destination",
    "sourceThenDestination",
    "destinationThenSource",
];

/// Returns `true` if `event` starts a transition statement.
fn starts_transition(event: &TokenEvent) -> bool {
    use crate::tokens::TokenKind;

    match event.kind() {
        TokenKind::Number => true,
        TokenKind::Symbol => event.is_symbol('+') || event.is_symbol('-'),
        TokenKind::Identifier => TRANSITION_KEYWORDS
            .iter()
            .any(|keyword| event.is_keyword(keyword)),
        TokenKind::SingleQuoted | TokenKind::DoubleQuoted => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        span::{Position, Span},
        tokens::{Token, TokenKind},
    };

    fn event(kind: TokenKind, text: &str) -> TokenEvent {
        TokenEvent::new(
            Token::new(kind, text, Span::new(0..text.len()), Position::default()),
            true,
            0,
        )
    }

    #[test]
    fn test_transition_starters() {
        assert!(starts_transition(&event(TokenKind::Identifier, "GOTO")));
        assert!(starts_transition(&event(TokenKind::Identifier, "sourceThenDestination")));
        assert!(starts_transition(&event(TokenKind::Number, "0.5")));
        assert!(starts_transition(&event(TokenKind::Symbol, "-")));
        assert!(!starts_transition(&event(TokenKind::Symbol, "*")));
        assert!(!starts_transition(&event(TokenKind::Identifier, "state")));
        assert!(!starts_transition(&event(TokenKind::DoubleQuoted, "if")));
    }
}
