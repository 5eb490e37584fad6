//! Layers and nested state machines.
//!
//! Both share one body grammar; a layer additionally accepts its blending
//! options. A state machine links its gathered transitions when it closes.

use log::debug;

use animalab_core::{
    Path,
    controller::{BlendingMode, Layer, NodeRef, Placed, StateMachine, StateMachineId},
    resource::ResourceKind,
};

use crate::{
    error::Result,
    grammar::{
        Ctl, Scope, Session, behaviour::BehaviourRule, condition::ConditionRule, name_of,
        out_of_scope, starts_transition, state::StateRule,
    },
    host::ObjectRef,
    linker::{self, DefaultRequest, SyncRequest},
    stack::{Rule, TokenEvent},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Layer,
    Nested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Name,
    OpenBrace,
    Item,
    Weight,
    Mask,
    Sync,
    Default,
    End,
}

#[derive(Debug)]
pub(crate) struct StateMachineRule {
    kind: Kind,
    expect: Expect,
    scope: Scope,
    id: Option<StateMachineId>,
    parent: Option<StateMachineId>,
    default: Option<DefaultRequest>,
}

impl StateMachineRule {
    /// A `layer` block with its root state machine.
    pub fn layer() -> Self {
        Self::new(Kind::Layer)
    }

    /// A `stateMachine` block nested in another state machine.
    pub fn nested() -> Self {
        Self::new(Kind::Nested)
    }

    fn new(kind: Kind) -> Self {
        Self {
            kind,
            expect: Expect::Name,
            scope: Scope::default(),
            id: None,
            parent: None,
            default: None,
        }
    }

    fn layer_mut<'s>(&self, session: &'s mut Session<'_>) -> Option<&'s mut Layer> {
        match self.kind {
            Kind::Layer => self
                .scope
                .layer
                .and_then(|layer| session.controller.layer_mut(layer)),
            Kind::Nested => None,
        }
    }

    fn declare(&mut self, event: &TokenEvent, name: &str, session: &mut Session<'_>) -> Result<()> {
        let id = session.controller.add_state_machine(StateMachine::new(name));
        let (layer, path) = match self.kind {
            Kind::Layer => {
                let layer = session.controller.add_layer(Layer::new(name, id));
                session.open_layer(layer);
                (layer, Path::from_segments([name]))
            }
            Kind::Nested => {
                let (Some(layer), Some(parent)) = (self.scope.layer, self.scope.state_machine)
                else {
                    return Err(out_of_scope(event, "a nested state machine"));
                };
                session
                    .controller
                    .state_machine_mut(parent)
                    .state_machines
                    .push(Placed::new(id));
                self.parent = Some(parent);
                (layer, self.scope.path.join(name))
            }
        };
        session.register(layer, path.clone(), NodeRef::StateMachine(id), event);
        session.persist(&self.scope.hint, ObjectRef::StateMachine(id), name);
        debug!(state_machine:% = path; "State machine opened");

        self.id = Some(id);
        self.scope.hint.push(name.to_string());
        self.scope.layer = Some(layer);
        self.scope.state_machine = Some(id);
        self.scope.state = None;
        self.scope.path = path;
        Ok(())
    }

    fn on_item(
        &mut self,
        event: &TokenEvent,
        session: &mut Session<'_>,
        control: &mut Ctl<'_>,
    ) -> Result<()> {
        if event.is_symbol('}') {
            return control.detach();
        }
        if event.is_symbol(';') {
            return Ok(());
        }
        if self.kind == Kind::Layer && self.on_layer_option(event, session) {
            return Ok(());
        }
        if event.is_keyword("default") {
            self.expect = Expect::Default;
            return Ok(());
        }
        if event.is_keyword("state") {
            return control.attach(StateRule::new());
        }
        if event.is_keyword("stateMachine") {
            return control.attach(StateMachineRule::nested());
        }
        if starts_transition(event) {
            return control.attach_with_token(ConditionRule::new());
        }
        if name_of(event).is_some() {
            return control.attach_with_token(BehaviourRule::new());
        }
        Err(event.unexpected("a state, a state machine, a transition or a behaviour"))
    }

    /// Handle a layer-only option keyword, returning `false` if `event` is
    /// not one.
    fn on_layer_option(&mut self, event: &TokenEvent, session: &mut Session<'_>) -> bool {
        let next = if event.is_keyword("weight") {
            Expect::Weight
        } else if event.is_keyword("mask") {
            Expect::Mask
        } else if event.is_keyword("sync") {
            Expect::Sync
        } else if let Ok(blending) = event.text().parse::<BlendingMode>() {
            if let Some(layer) = self.layer_mut(session) {
                layer.blending = blending;
            }
            Expect::End
        } else if event.is_keyword("ikPass") {
            if let Some(layer) = self.layer_mut(session) {
                layer.ik_pass = true;
            }
            Expect::End
        } else if event.is_keyword("syncTiming") {
            if let Some(layer) = self.layer_mut(session) {
                layer.sync_timing = true;
            }
            Expect::End
        } else {
            return false;
        };
        self.expect = next;
        true
    }
}

impl<'h> Rule<Scope, Session<'h>> for StateMachineRule {
    fn hint(&self) -> &str {
        match self.kind {
            Kind::Layer => "layer",
            Kind::Nested => "stateMachine",
        }
    }

    fn context(&self) -> Option<&Scope> {
        Some(&self.scope)
    }

    fn on_attach(&mut self, inherited: Option<&Scope>, _session: &mut Session<'h>) -> Result<()> {
        self.scope = inherited.cloned().unwrap_or_default();
        Ok(())
    }

    fn on_token(
        &mut self,
        event: &TokenEvent,
        session: &mut Session<'h>,
        control: &mut Ctl<'h>,
    ) -> Result<()> {
        match self.expect {
            Expect::Name => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a name"))?;
                self.declare(event, name, session)?;
                self.expect = Expect::OpenBrace;
            }
            Expect::OpenBrace if event.is_symbol('{') => self.expect = Expect::Item,
            Expect::OpenBrace => return Err(event.unexpected("`{`")),
            Expect::Item => return self.on_item(event, session, control),
            Expect::Weight => {
                let weight = event
                    .token()
                    .as_f32()
                    .ok_or_else(|| event.unexpected("a number"))?;
                if let Some(layer) = self.layer_mut(session) {
                    layer.weight = weight;
                }
                self.expect = Expect::End;
            }
            Expect::Mask => {
                let reference = name_of(event).ok_or_else(|| event.unexpected("a mask reference"))?;
                let mask = session.host.resolve_resource(reference, ResourceKind::AvatarMask);
                if mask.is_none() {
                    debug!(reference; "Avatar mask not resolved");
                }
                if let Some(layer) = self.layer_mut(session) {
                    layer.mask = mask;
                }
                self.expect = Expect::End;
            }
            Expect::Sync => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a layer name"))?;
                if let Some(layer) = self.scope.layer {
                    session.sync_requests.push(SyncRequest {
                        layer,
                        name: name.to_string(),
                        span: event.span(),
                        position: event.position(),
                    });
                }
                self.expect = Expect::End;
            }
            Expect::Default => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a state name"))?;
                self.default = Some(DefaultRequest {
                    name: name.to_string(),
                    span: event.span(),
                    position: event.position(),
                });
                self.expect = Expect::End;
            }
            Expect::End if event.is_symbol(';') => self.expect = Expect::Item,
            Expect::End => return Err(event.unexpected("`;`")),
        }
        Ok(())
    }

    fn on_detach(&mut self, session: &mut Session<'h>) -> Result<()> {
        let (Some(id), Some(layer)) = (self.id, self.scope.layer) else {
            return Ok(());
        };
        if let Some(request) = self.default.take() {
            linker::link_default(session, id, layer, &self.scope.path, request);
        }
        linker::link_scope(session, id, self.parent);
        debug!(state_machine:% = self.scope.path; "State machine closed");
        Ok(())
    }
}
