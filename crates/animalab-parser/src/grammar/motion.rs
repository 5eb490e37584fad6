//! Motions: clips and blend trees.
//!
//! ```text
//! clip "Clips/run.anim" * 1.5 + 0.25 mirror;
//! blendtree "Locomotion" simple1D(speed) threshold(0, 1) {
//!     0: clip "Clips/idle.anim";
//!     1: clip "Clips/run.anim";
//! }
//! ```
//!
//! The same rule parses a state's root motion and every blend tree child;
//! children attach a nested [`MotionRule`] after their key.

use log::{debug, trace};

use animalab_core::{
    controller::{Binding, MotionId, StateId},
    geometry::Vec2,
    motion::{BlendTree, BlendType, ChildMotion, Motion},
    resource::ResourceKind,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    grammar::{Ctl, Scope, Session, name_of, out_of_scope},
    host::ObjectRef,
    stack::{Rule, TokenEvent},
    tokens::TokenKind,
};

/// The key a blend tree child is written under.
#[derive(Debug, Clone, PartialEq)]
enum ChildKey {
    /// `0.5:`, a 1D threshold.
    Threshold(f32),
    /// `(x, y):`, a 2D position.
    Position(f32, f32),
    /// `param:`, the parameter of a direct blend.
    Parameter(String),
}

/// Where the parsed motion goes when the rule detaches.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    /// Not known until attached: the enclosing state.
    Root,
    State(StateId),
    Child { tree: MotionId, key: ChildKey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Start,
    ClipReference,
    TreeName,
    TreeType,
    AfterType,
    Parameter(usize),
    ParameterNext(usize),
    ThresholdOpen,
    ThresholdMin,
    ThresholdComma,
    ThresholdMax,
    ThresholdClose,
    Key,
    KeyX,
    KeyComma,
    KeyY,
    KeyClose,
    Colon,
    Modifier,
    Speed,
    Offset,
}

/// Modifiers written after a motion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Modifiers {
    speed: Option<f32>,
    offset: Option<f32>,
    mirror: bool,
    sign: f32,
}

#[derive(Debug)]
pub(crate) struct MotionRule {
    expect: Expect,
    scope: Scope,
    slot: Slot,
    motion: Option<MotionId>,
    /// Set for blend trees once their body closed.
    closed_tree: bool,
    modifiers: Modifiers,
    key: Option<ChildKey>,
}

impl MotionRule {
    /// The motion of the enclosing state.
    pub fn root() -> Self {
        Self::new(Slot::Root)
    }

    fn child(tree: MotionId, key: ChildKey) -> Self {
        Self::new(Slot::Child { tree, key })
    }

    fn new(slot: Slot) -> Self {
        Self {
            expect: Expect::Start,
            scope: Scope::default(),
            slot,
            motion: None,
            closed_tree: false,
            modifiers: Modifiers {
                sign: 1.0,
                ..Modifiers::default()
            },
            key: None,
        }
    }

    fn tree_mut<'s>(&self, session: &'s mut Session<'_>) -> Option<&'s mut BlendTree> {
        self.motion
            .and_then(|id| session.controller.motion_mut(id).as_blend_tree_mut())
    }

    fn number(event: &TokenEvent) -> Result<f32> {
        event
            .token()
            .as_f32()
            .ok_or_else(|| event.unexpected("a number"))
    }

    fn on_start(&mut self, event: &TokenEvent) -> Result<()> {
        self.expect = if event.is_keyword("clip") {
            Expect::ClipReference
        } else if event.is_keyword("blendtree") {
            Expect::TreeName
        } else if event.is_keyword("empty") && matches!(self.slot, Slot::Child { .. }) {
            Expect::Modifier
        } else {
            return Err(event.unexpected("`clip`, `blendtree` or `empty`"));
        };
        Ok(())
    }

    fn on_tree_body(&mut self, event: &TokenEvent) -> Result<()> {
        if event.is_symbol('}') {
            self.closed_tree = true;
            self.expect = Expect::Modifier;
            return Ok(());
        }
        if event.is_symbol('(') {
            self.key = Some(ChildKey::Position(0.0, 0.0));
            self.expect = Expect::KeyX;
            return Ok(());
        }
        self.key = Some(if event.kind() == TokenKind::Number {
            ChildKey::Threshold(Self::number(event)?)
        } else {
            let name = name_of(event).ok_or_else(|| event.unexpected("a child key or `}`"))?;
            ChildKey::Parameter(name.to_string())
        });
        self.expect = Expect::Colon;
        Ok(())
    }

    fn attach_child(&mut self, event: &TokenEvent, control: &mut Ctl<'_>) -> Result<()> {
        if !event.is_symbol(':') {
            return Err(event.unexpected("`:`"));
        }
        let (Some(tree), Some(key)) = (self.motion, self.key.take()) else {
            return Err(out_of_scope(event, "a blend tree child"));
        };
        self.expect = Expect::Key;
        control.attach(MotionRule::child(tree, key))
    }

    fn on_modifier(&mut self, event: &TokenEvent, control: &mut Ctl<'_>) -> Result<()> {
        if event.is_symbol(';') {
            return control.detach();
        }
        if self.closed_tree && event.line_break() {
            return control.detach_and_forward();
        }
        if event.is_symbol('*') {
            self.expect = Expect::Speed;
        } else if event.is_symbol('+') {
            self.modifiers.sign = 1.0;
            self.expect = Expect::Offset;
        } else if event.is_symbol('-') {
            self.modifiers.sign = -1.0;
            self.expect = Expect::Offset;
        } else if event.kind() == TokenKind::Number {
            self.modifiers.offset = Some(Self::number(event)?);
        } else if event.is_keyword("mirror") {
            self.modifiers.mirror = true;
        } else if self.closed_tree {
            return control.detach_and_forward();
        } else {
            return Err(event.unexpected("a motion modifier or `;`"));
        }
        Ok(())
    }
}

impl<'h> Rule<Scope, Session<'h>> for MotionRule {
    fn hint(&self) -> &str {
        "motion"
    }

    fn context(&self) -> Option<&Scope> {
        Some(&self.scope)
    }

    fn on_attach(&mut self, inherited: Option<&Scope>, _session: &mut Session<'h>) -> Result<()> {
        self.scope = inherited.cloned().unwrap_or_default();
        if self.slot == Slot::Root {
            self.slot = match self.scope.state {
                Some(state) => Slot::State(state),
                None => {
                    return Err(Diagnostic::error("a motion must belong to a state")
                        .with_code(ErrorCode::E100));
                }
            };
        }
        Ok(())
    }

    fn on_token(
        &mut self,
        event: &TokenEvent,
        session: &mut Session<'h>,
        control: &mut Ctl<'h>,
    ) -> Result<()> {
        match self.expect {
            Expect::Start => self.on_start(event)?,
            Expect::ClipReference => {
                let reference =
                    name_of(event).ok_or_else(|| event.unexpected("a clip reference"))?;
                match session
                    .host
                    .resolve_resource(reference, ResourceKind::AnimationClip)
                {
                    Some(clip) => self.motion = Some(session.controller.add_motion(Motion::Clip(clip))),
                    None => debug!(reference; "Clip not resolved"),
                }
                self.expect = Expect::Modifier;
            }
            Expect::TreeName => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a blend tree name"))?;
                let id = session
                    .controller
                    .add_motion(Motion::BlendTree(BlendTree::new(name)));
                session.persist(&self.scope.hint, ObjectRef::Motion(id), name);
                self.scope.hint.push(name.to_string());
                self.motion = Some(id);
                self.expect = Expect::TreeType;
            }
            Expect::TreeType => {
                let blend_type = event.text().parse::<BlendType>().map_err(|err| {
                    Diagnostic::error(err.to_string())
                        .with_code(ErrorCode::E103)
                        .with_label(event.span(), "not a blend type")
                        .with_position(event.position())
                        .with_help("expected simple1D, simpleDirectional2D, freeformDirectional2D, freeformCartesian2D or direct")
                })?;
                if let Some(tree) = self.tree_mut(session) {
                    tree.blend_type = blend_type;
                }
                self.expect = Expect::AfterType;
            }
            Expect::AfterType => {
                self.expect = if event.is_symbol('(') {
                    Expect::Parameter(0)
                } else if event.is_keyword("threshold") {
                    Expect::ThresholdOpen
                } else if event.is_symbol('{') {
                    Expect::Key
                } else {
                    return Err(event.unexpected("`(`, `threshold` or `{`"));
                };
            }
            Expect::Parameter(index) => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a parameter name"))?;
                if let Some(tree) = self.tree_mut(session) {
                    match index {
                        0 => tree.parameter = name.to_string(),
                        _ => tree.parameter_y = name.to_string(),
                    }
                }
                self.expect = Expect::ParameterNext(index);
            }
            Expect::ParameterNext(0) if event.is_symbol(',') => {
                self.expect = Expect::Parameter(1);
            }
            Expect::ParameterNext(_) if event.is_symbol(')') => self.expect = Expect::AfterType,
            Expect::ParameterNext(_) => return Err(event.unexpected("`,` or `)`")),
            Expect::ThresholdOpen if event.is_symbol('(') => self.expect = Expect::ThresholdMin,
            Expect::ThresholdOpen => return Err(event.unexpected("`(`")),
            Expect::ThresholdMin => {
                let min = Self::number(event)?;
                if let Some(tree) = self.tree_mut(session) {
                    tree.thresholds = Some((min, min));
                }
                self.expect = Expect::ThresholdComma;
            }
            Expect::ThresholdComma | Expect::KeyComma if event.is_symbol(',') => {
                self.expect = match self.expect {
                    Expect::ThresholdComma => Expect::ThresholdMax,
                    _ => Expect::KeyY,
                };
            }
            Expect::ThresholdComma | Expect::KeyComma => return Err(event.unexpected("`,`")),
            Expect::ThresholdMax => {
                let max = Self::number(event)?;
                if let Some((_, upper)) = self
                    .tree_mut(session)
                    .and_then(|tree| tree.thresholds.as_mut())
                {
                    *upper = max;
                }
                self.expect = Expect::ThresholdClose;
            }
            Expect::ThresholdClose | Expect::KeyClose if event.is_symbol(')') => {
                self.expect = match self.expect {
                    Expect::ThresholdClose => Expect::AfterType,
                    _ => Expect::Colon,
                };
            }
            Expect::ThresholdClose | Expect::KeyClose => return Err(event.unexpected("`)`")),
            Expect::Key => self.on_tree_body(event)?,
            Expect::KeyX => {
                let x = Self::number(event)?;
                if let Some(ChildKey::Position(key_x, _)) = self.key.as_mut() {
                    *key_x = x;
                }
                self.expect = Expect::KeyComma;
            }
            Expect::KeyY => {
                let y = Self::number(event)?;
                if let Some(ChildKey::Position(_, key_y)) = self.key.as_mut() {
                    *key_y = y;
                }
                self.expect = Expect::KeyClose;
            }
            Expect::Colon => self.attach_child(event, control)?,
            Expect::Modifier => self.on_modifier(event, control)?,
            Expect::Speed => {
                self.modifiers.speed = Some(Self::number(event)?);
                self.expect = Expect::Modifier;
            }
            Expect::Offset => {
                if event.is_symbol('-') {
                    self.modifiers.sign = -self.modifiers.sign;
                } else if !event.is_symbol('+') {
                    self.modifiers.offset = Some(self.modifiers.sign * Self::number(event)?);
                    self.expect = Expect::Modifier;
                }
            }
        }
        Ok(())
    }

    fn on_detach(&mut self, session: &mut Session<'h>) -> Result<()> {
        let Modifiers {
            speed,
            offset,
            mirror,
            ..
        } = self.modifiers;
        match &self.slot {
            Slot::Root => {}
            Slot::State(state) => {
                let state = session.controller.state_mut(*state);
                state.motion = self.motion;
                if let Some(speed) = speed {
                    state.speed = Binding::Literal(speed);
                }
                if let Some(offset) = offset {
                    state.cycle_offset = Binding::Literal(offset);
                }
                if mirror {
                    state.mirror = Binding::Literal(true);
                }
            }
            Slot::Child { tree, key } => {
                let mut child = ChildMotion {
                    motion: self.motion,
                    time_scale: speed.unwrap_or(1.0),
                    cycle_offset: offset.unwrap_or(0.0),
                    mirror,
                    ..ChildMotion::default()
                };
                match key {
                    ChildKey::Threshold(x) => {
                        child.threshold = *x;
                        child.position = Vec2::new(*x, 0.0);
                    }
                    ChildKey::Position(x, y) => {
                        child.threshold = *x;
                        child.position = Vec2::new(*x, *y);
                    }
                    ChildKey::Parameter(name) => child.direct_parameter = name.clone(),
                }
                if let Some(tree) = session.controller.motion_mut(*tree).as_blend_tree_mut() {
                    tree.children.push(child);
                }
            }
        }
        trace!(motion:? = self.motion; "Motion closed");
        Ok(())
    }
}
