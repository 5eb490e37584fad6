//! State blocks: `state <name> { ... }`.

use log::trace;

use animalab_core::controller::{Binding, NodeRef, Placed, State, StateId};

use crate::{
    error::Result,
    grammar::{
        Ctl, Scope, Session, behaviour::BehaviourRule, condition::ConditionRule,
        motion::MotionRule, name_of, out_of_scope, starts_transition,
    },
    host::ObjectRef,
    stack::{Rule, TokenEvent},
    tokens::TokenKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Name,
    OpenBrace,
    Item,
    Speed,
    CycleOffset,
    Time,
    Mirror,
    Tag,
    End,
}

#[derive(Debug)]
pub(crate) struct StateRule {
    expect: Expect,
    scope: Scope,
    id: Option<StateId>,
}

impl StateRule {
    pub fn new() -> Self {
        Self {
            expect: Expect::Name,
            scope: Scope::default(),
            id: None,
        }
    }

    fn declare(&mut self, event: &TokenEvent, name: &str, session: &mut Session<'_>) -> Result<()> {
        let (Some(layer), Some(machine)) = (self.scope.layer, self.scope.state_machine) else {
            return Err(out_of_scope(event, "a state"));
        };
        let id = session.controller.add_state(State::new(name));
        session
            .controller
            .state_machine_mut(machine)
            .states
            .push(Placed::new(id));
        let path = self.scope.path.join(name);
        session.register(layer, path, NodeRef::State(id), event);
        session.persist(&self.scope.hint, ObjectRef::State(id), name);

        self.id = Some(id);
        self.scope.state = Some(id);
        self.scope.hint.push(name.to_string());
        Ok(())
    }

    fn state_mut<'s>(&self, session: &'s mut Session<'_>) -> Option<&'s mut State> {
        self.id.map(|id| session.controller.state_mut(id))
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
        self.expect = if event.is_keyword("speed") {
            Expect::Speed
        } else if event.is_keyword("cycleOffset") {
            Expect::CycleOffset
        } else if event.is_keyword("time") {
            Expect::Time
        } else if event.is_keyword("mirror") {
            Expect::Mirror
        } else if event.is_keyword("tag") {
            Expect::Tag
        } else if event.is_keyword("ikOnFeet") {
            if let Some(state) = self.state_mut(session) {
                state.ik_on_feet = true;
            }
            Expect::End
        } else if event.is_keyword("writeDefaults") {
            if let Some(state) = self.state_mut(session) {
                state.write_defaults = true;
            }
            Expect::End
        } else if event.is_keyword("empty") {
            if let Some(state) = self.state_mut(session) {
                state.motion = None;
            }
            Expect::End
        } else if event.is_keyword("clip") || event.is_keyword("blendtree") {
            return control.attach_with_token(MotionRule::root());
        } else if starts_transition(event) {
            return control.attach_with_token(ConditionRule::new());
        } else if name_of(event).is_some() {
            return control.attach_with_token(BehaviourRule::new());
        } else {
            return Err(event.unexpected("a state option, a motion, a transition or a behaviour"));
        };
        Ok(())
    }

    /// A literal number or a parameter name.
    fn binding(event: &TokenEvent) -> Result<Binding<f32>> {
        match event.kind() {
            TokenKind::Number => event
                .token()
                .as_f32()
                .map(Binding::Literal)
                .ok_or_else(|| event.unexpected("a number")),
            _ => name_of(event)
                .map(|name| Binding::Parameter(name.to_string()))
                .ok_or_else(|| event.unexpected("a number or a parameter name")),
        }
    }
}

impl<'h> Rule<Scope, Session<'h>> for StateRule {
    fn hint(&self) -> &str {
        "state"
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
                let name = name_of(event).ok_or_else(|| event.unexpected("a state name"))?;
                self.declare(event, name, session)?;
                self.expect = Expect::OpenBrace;
            }
            Expect::OpenBrace if event.is_symbol('{') => self.expect = Expect::Item,
            Expect::OpenBrace => return Err(event.unexpected("`{`")),
            Expect::Item => return self.on_item(event, session, control),
            Expect::Speed => {
                let speed = Self::binding(event)?;
                if let Some(state) = self.state_mut(session) {
                    state.speed = speed;
                }
                self.expect = Expect::End;
            }
            Expect::CycleOffset => {
                let offset = Self::binding(event)?;
                if let Some(state) = self.state_mut(session) {
                    state.cycle_offset = offset;
                }
                self.expect = Expect::End;
            }
            Expect::Time => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a parameter name"))?;
                if let Some(state) = self.state_mut(session) {
                    state.time_parameter = Some(name.to_string());
                }
                self.expect = Expect::End;
            }
            Expect::Mirror if event.is_symbol(';') => {
                if let Some(state) = self.state_mut(session) {
                    state.mirror = Binding::Literal(true);
                }
                self.expect = Expect::Item;
            }
            Expect::Mirror => {
                let name = name_of(event).ok_or_else(|| event.unexpected("`;` or a parameter"))?;
                if let Some(state) = self.state_mut(session) {
                    state.mirror = Binding::Parameter(name.to_string());
                }
                self.expect = Expect::End;
            }
            Expect::Tag => {
                let tag = name_of(event).ok_or_else(|| event.unexpected("a tag"))?;
                if let Some(state) = self.state_mut(session) {
                    state.tag = tag.to_string();
                }
                self.expect = Expect::End;
            }
            Expect::End if event.is_symbol(';') => self.expect = Expect::Item,
            Expect::End => return Err(event.unexpected("`;`")),
        }
        Ok(())
    }

    fn on_detach(&mut self, _session: &mut Session<'h>) -> Result<()> {
        if let Some(id) = self.id {
            trace!(state = id.index(); "State closed");
        }
        Ok(())
    }
}
