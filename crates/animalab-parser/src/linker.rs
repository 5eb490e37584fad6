//! Path-based reference resolution.
//!
//! Transitions name their destinations by path and may point at nodes that
//! are declared later, so they are gathered while a state machine is parsed
//! and linked when it closes. A reference that still cannot be resolved is
//! carried to the enclosing state machine and retried there; the layer root
//! drops whatever is left with a warning.

use log::{debug, trace};

use animalab_core::{
    Path,
    controller::{NodeRef, StateId, StateMachineId},
    transition::{Destination, Transition},
};

use crate::{
    error::{Diagnostic, ErrorCode},
    grammar::Session,
    host::ObjectRef,
    span::{Position, Span},
};

/// Where a transition leads before it is linked.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
    Exit,
    Node(Path),
    /// Neither `goto` nor `end` was given.
    Missing,
}

/// The list a linked transition is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Home {
    Entry(StateMachineId),
    Any(StateMachineId),
    State(StateId),
}

/// A transition waiting for its destination to be linked.
#[derive(Debug, Clone)]
pub(crate) struct PendingTransition {
    pub transition: Transition,
    pub target: Target,
    pub home: Home,
    /// The state machine whose close links this transition next.
    pub owner: StateMachineId,
    pub layer: usize,
    pub hint: Vec<String>,
    pub span: Span,
    pub position: Position,
}

/// A layer's request to be synced with another layer, by name.
#[derive(Debug, Clone)]
pub(crate) struct SyncRequest {
    pub layer: usize,
    pub name: String,
    pub span: Span,
    pub position: Position,
}

/// A `default` declaration waiting to be resolved.
#[derive(Debug, Clone)]
pub(crate) struct DefaultRequest {
    pub name: String,
    pub span: Span,
    pub position: Position,
}

/// Why a pending transition could not be linked.
enum Unresolved {
    Missing,
    NotFound(Path),
}

fn resolve(session: &Session<'_>, pending: &PendingTransition) -> Result<Destination, Unresolved> {
    match &pending.target {
        Target::Exit => Ok(Destination::Exit),
        Target::Missing => Err(Unresolved::Missing),
        Target::Node(path) => match session.lookup(pending.layer, path) {
            Some(NodeRef::State(id)) => Ok(Destination::State(id)),
            Some(NodeRef::StateMachine(id)) => Ok(Destination::StateMachine(id)),
            None => Err(Unresolved::NotFound(path.clone())),
        },
    }
}

/// Link the transitions gathered for `scope` as it closes.
///
/// Unresolved transitions move to `parent`, or are dropped with a warning
/// when `scope` is a layer root.
pub(crate) fn link_scope(
    session: &mut Session<'_>,
    scope: StateMachineId,
    parent: Option<StateMachineId>,
) {
    let (mine, others): (Vec<_>, Vec<_>) = std::mem::take(&mut session.pending)
        .into_iter()
        .partition(|pending| pending.owner == scope);
    session.pending = others;

    let mut linked = 0;
    let mut carried = 0;
    for mut pending in mine {
        match resolve(session, &pending) {
            Ok(destination) => {
                pending.transition.destination = destination;
                let id = session.controller.add_transition(pending.transition);
                match pending.home {
                    Home::Entry(machine) => session
                        .controller
                        .state_machine_mut(machine)
                        .entry_transitions
                        .push(id),
                    Home::Any(machine) => session
                        .controller
                        .state_machine_mut(machine)
                        .any_state_transitions
                        .push(id),
                    Home::State(state) => session.controller.state_mut(state).transitions.push(id),
                }
                session.persist(&pending.hint, ObjectRef::Transition(id), "");
                linked += 1;
            }
            Err(reason) => {
                if let (Unresolved::NotFound(_), Some(parent)) = (&reason, parent) {
                    trace!(owner = parent.index(); "Carry transition to enclosing scope");
                    pending.owner = parent;
                    session.pending.push(pending);
                    carried += 1;
                    continue;
                }
                let diagnostic = match (reason, pending.home) {
                    (Unresolved::Missing, _) => {
                        Diagnostic::warning("transition has no destination and was dropped")
                            .with_code(ErrorCode::E202)
                            .with_help("add `goto <state>` or `end`")
                    }
                    (Unresolved::NotFound(path), Home::State(state)) => {
                        let source = &session.controller.state(state).name;
                        Diagnostic::warning(format!(
                            "destination `{path}` of a transition from `{source}` not found"
                        ))
                        .with_code(ErrorCode::E202)
                    }
                    (Unresolved::NotFound(path), _) => {
                        Diagnostic::warning(format!("destination `{path}` not found"))
                            .with_code(ErrorCode::E202)
                    }
                };
                session.warn(
                    diagnostic
                        .with_label(pending.span, "in this transition")
                        .with_position(pending.position),
                );
            }
        }
    }
    debug!(state_machine = scope.index(), linked, carried; "Linked scope");
}

/// Resolve a state machine's `default` state against its own path.
pub(crate) fn link_default(
    session: &mut Session<'_>,
    scope: StateMachineId,
    layer: usize,
    path: &Path,
    request: DefaultRequest,
) {
    let target = path.join(request.name.as_str());
    match session.lookup(layer, &target) {
        Some(NodeRef::State(state)) => {
            session.controller.state_machine_mut(scope).default_state = Some(state);
        }
        _ => {
            let diagnostic = Diagnostic::warning(format!("default state `{target}` not found"))
                .with_code(ErrorCode::E203)
                .with_label(request.span, "no state with this name")
                .with_position(request.position);
            session.warn(diagnostic);
        }
    }
}

/// Resolve layer sync names once every layer is known.
pub(crate) fn link_sync_layers(session: &mut Session<'_>) {
    for request in std::mem::take(&mut session.sync_requests) {
        let index = session
            .controller
            .layers()
            .iter()
            .position(|layer| layer.name == request.name);
        if let Some(index) = index {
            if let Some(layer) = session.controller.layer_mut(request.layer) {
                layer.synced_layer = Some(index);
            }
            continue;
        }
        let diagnostic = Diagnostic::warning(format!("Sync layer \"{}\" not found", request.name))
            .with_code(ErrorCode::E204)
            .with_label(request.span, "no layer with this name")
            .with_position(request.position);
        session.warn(diagnostic);
    }
}
