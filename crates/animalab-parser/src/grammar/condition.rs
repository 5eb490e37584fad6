//! Transition statements.
//!
//! ```text
//! [muted] [solo] [any] [noSelf] [wait(t)] if(a > 0 && !b || c == 2)
//!     [fade(d[s])] [+|- offset] [source [ordered]] (end | goto Target);
//! ```
//!
//! Modifiers may appear in any order. Each `||` group, or each repeated
//! `if`, yields its own transition sharing the modifiers.

use log::trace;

use animalab_core::{
    Path,
    transition::{Condition, ConditionMode, Destination, InterruptionSource, Transition},
};

use crate::{
    error::Result,
    grammar::{Ctl, Scope, Session, name_of, out_of_scope},
    linker::{Home, PendingTransition, Target},
    span::{Position, Span},
    stack::{Rule, TokenEvent},
    tokens::TokenKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Modifier,
    /// A parameter, possibly negated; `opening` allows a `(` first, right
    /// after `if` or an unbracketed `||`.
    Condition { opening: bool },
    Negated,
    Operator,
    Value(ConditionMode),
    WaitOpen,
    WaitValue,
    WaitClose,
    FadeOpen,
    FadeValue,
    FadeUnit { paren: bool },
    FadeClose,
    Offset,
    Ordered,
    GotoStart,
    GotoSegment,
    GotoNext,
}

/// Whether the token was consumed or has to be looked at again in the new
/// state.
enum Step {
    Done,
    Again,
}

#[derive(Debug, Clone, PartialEq)]
enum Goto {
    Exit,
    Relative(String),
    /// Segments below the layer root.
    Absolute(Vec<String>),
}

#[derive(Debug)]
pub(crate) struct ConditionRule {
    expect: Expect,
    scope: Scope,
    transition: Transition,
    groups: Vec<Vec<Condition>>,
    bracket: bool,
    parameter: Option<(String, bool)>,
    last_symbol: Option<char>,
    sign: f32,
    any: bool,
    goto: Option<Goto>,
    segments: Vec<String>,
    absolute: bool,
    start: Option<(Span, Position)>,
}

impl ConditionRule {
    pub fn new() -> Self {
        Self {
            expect: Expect::Modifier,
            scope: Scope::default(),
            transition: Transition::new(Destination::Exit),
            groups: Vec::new(),
            bracket: false,
            parameter: None,
            last_symbol: None,
            sign: 1.0,
            any: false,
            goto: None,
            segments: Vec::new(),
            absolute: false,
            start: None,
        }
    }

    fn number(event: &TokenEvent) -> Result<f32> {
        event
            .token()
            .as_f32()
            .ok_or_else(|| event.unexpected("a number"))
    }

    fn commit(&mut self, mode: ConditionMode, threshold: f32) {
        let Some((parameter, _)) = self.parameter.take() else {
            return;
        };
        if let Some(group) = self.groups.last_mut() {
            group.push(Condition::new(parameter, mode, threshold));
        }
    }

    fn step(
        &mut self,
        event: &TokenEvent,
        session: &mut Session<'_>,
        control: &mut Ctl<'_>,
    ) -> Result<Step> {
        match self.expect {
            Expect::Modifier => return self.modifier(event, session, control),
            Expect::Condition { opening } => {
                if opening && !self.bracket && event.is_symbol('(') {
                    self.bracket = true;
                    self.expect = Expect::Condition { opening: false };
                } else if event.is_symbol('!') {
                    self.expect = Expect::Negated;
                } else {
                    let name = name_of(event).ok_or_else(|| event.unexpected("a condition"))?;
                    self.parameter = Some((name.to_string(), false));
                    self.expect = Expect::Operator;
                }
            }
            Expect::Negated => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a parameter name"))?;
                self.parameter = Some((name.to_string(), true));
                self.expect = Expect::Operator;
            }
            Expect::Operator => return self.operator(event),
            Expect::Value(mode) => {
                let threshold = Self::number(event)?;
                self.commit(mode, threshold);
                self.expect = Expect::Modifier;
            }
            Expect::WaitOpen if event.is_symbol('(') => self.expect = Expect::WaitValue,
            Expect::WaitOpen => {
                self.transition.exit_time = Some(Self::number(event)?);
                self.expect = Expect::Modifier;
            }
            Expect::WaitValue => {
                self.transition.exit_time = Some(Self::number(event)?);
                self.expect = Expect::WaitClose;
            }
            Expect::WaitClose | Expect::FadeClose if event.is_symbol(')') => {
                self.expect = Expect::Modifier;
            }
            Expect::WaitClose | Expect::FadeClose => return Err(event.unexpected("`)`")),
            Expect::FadeOpen if event.is_symbol('(') => self.expect = Expect::FadeValue,
            Expect::FadeOpen => {
                self.transition.duration = Self::number(event)?;
                self.expect = Expect::FadeUnit { paren: false };
            }
            Expect::FadeValue => {
                self.transition.duration = Self::number(event)?;
                self.expect = Expect::FadeUnit { paren: true };
            }
            Expect::FadeUnit { paren } => {
                if event.is_keyword("s") {
                    self.transition.fixed_duration = true;
                    self.expect = if paren {
                        Expect::FadeClose
                    } else {
                        Expect::Modifier
                    };
                } else if paren {
                    self.expect = Expect::FadeClose;
                    return Ok(Step::Again);
                } else {
                    self.expect = Expect::Modifier;
                    return Ok(Step::Again);
                }
            }
            Expect::Offset => {
                if event.is_symbol('-') {
                    self.sign = -self.sign;
                } else if !event.is_symbol('+') {
                    self.transition.offset = self.sign * Self::number(event)?;
                    self.expect = Expect::Modifier;
                }
            }
            Expect::Ordered => {
                self.expect = Expect::Modifier;
                if !event.is_keyword("ordered") {
                    return Ok(Step::Again);
                }
                self.transition.ordered_interruption = true;
            }
            Expect::GotoStart | Expect::GotoNext if event.is_symbol('/') => {
                self.absolute = true;
                self.expect = Expect::GotoSegment;
            }
            Expect::GotoStart | Expect::GotoSegment => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a destination name"))?;
                self.segments.push(name.to_string());
                self.expect = Expect::GotoNext;
            }
            Expect::GotoNext => {
                let mut segments = std::mem::take(&mut self.segments);
                self.goto = Some(if self.absolute || segments.len() > 1 {
                    Goto::Absolute(segments)
                } else {
                    Goto::Relative(segments.pop().unwrap_or_default())
                });
                self.expect = Expect::Modifier;
                return Ok(Step::Again);
            }
        }
        Ok(Step::Done)
    }

    fn operator(&mut self, event: &TokenEvent) -> Result<Step> {
        let negated = self.parameter.as_ref().is_some_and(|(_, negated)| *negated);
        let symbol = match event.kind() {
            TokenKind::Symbol => event.text(),
            _ => "",
        };
        let comparison = match (self.last_symbol, symbol) {
            (None, ">") => Some(ConditionMode::Greater),
            (None, "<") => Some(ConditionMode::Less),
            (Some('='), "=") => Some(ConditionMode::Equals),
            (Some('!'), "=") => Some(ConditionMode::NotEqual),
            (None, "=" | "!") => {
                self.last_symbol = symbol.chars().next();
                return Ok(Step::Done);
            }
            (Some(_), _) => return Err(event.unexpected("`==` or `!=`")),
            _ => None,
        };
        if let Some(mode) = comparison {
            if negated {
                return Err(event.unexpected("a negated parameter without a comparison"));
            }
            self.last_symbol = None;
            self.expect = Expect::Value(mode);
            return Ok(Step::Done);
        }
        let mode = if negated {
            ConditionMode::IfNot
        } else {
            ConditionMode::If
        };
        self.commit(mode, 0.0);
        self.expect = Expect::Modifier;
        Ok(Step::Again)
    }

    fn modifier(
        &mut self,
        event: &TokenEvent,
        session: &mut Session<'_>,
        control: &mut Ctl<'_>,
    ) -> Result<Step> {
        if let Some(pending) = self.last_symbol {
            if !event.is_symbol(pending) {
                return Err(event.unexpected(&format!("`{pending}{pending}`")));
            }
            self.last_symbol = None;
            if self.groups.is_empty() {
                return Err(event.unexpected("`if` before a condition"));
            }
            let alternative = pending == '|';
            if alternative {
                self.groups.push(Vec::new());
            }
            self.expect = Expect::Condition {
                opening: alternative && !self.bracket,
            };
            return Ok(Step::Done);
        }

        match event.kind() {
            TokenKind::Number => {
                self.transition.offset = Self::number(event)?;
                return Ok(Step::Done);
            }
            TokenKind::Symbol => {
                if event.is_symbol(';') {
                    if self.bracket {
                        return Err(event.unexpected("`)`"));
                    }
                    self.emit(event, session)?;
                    control.detach()?;
                } else if event.is_symbol('&') || event.is_symbol('|') {
                    self.last_symbol = event.text().chars().next();
                } else if event.is_symbol(')') && self.bracket {
                    self.bracket = false;
                } else if event.is_symbol('+') {
                    self.sign = 1.0;
                    self.expect = Expect::Offset;
                } else if event.is_symbol('-') {
                    self.sign = -1.0;
                    self.expect = Expect::Offset;
                } else {
                    return Err(event.unexpected("a transition modifier or `;`"));
                }
                return Ok(Step::Done);
            }
            TokenKind::Identifier => {}
            TokenKind::SingleQuoted | TokenKind::DoubleQuoted => {
                return Err(event.unexpected("a transition modifier or `;`"));
            }
        }

        if event.is_keyword("if") {
            self.groups.push(Vec::new());
            self.expect = Expect::Condition { opening: true };
        } else if event.is_keyword("any") {
            self.any = true;
        } else if event.is_keyword("noSelf") {
            self.transition.can_transition_to_self = false;
        } else if event.is_keyword("muted") {
            self.transition.muted = true;
        } else if event.is_keyword("solo") {
            self.transition.solo = true;
        } else if event.is_keyword("wait") {
            self.expect = Expect::WaitOpen;
        } else if event.is_keyword("fade") {
            self.expect = Expect::FadeOpen;
        } else if event.is_keyword("end") {
            self.goto = Some(Goto::Exit);
        } else if event.is_keyword("goto") {
            self.segments.clear();
            self.absolute = false;
            self.expect = Expect::GotoStart;
        } else if let Ok(source) = event.text().parse::<InterruptionSource>() {
            self.transition.interruption_source = source;
            self.expect = Expect::Ordered;
        } else {
            return Err(event.unexpected("a transition modifier or `;`"));
        }
        Ok(Step::Done)
    }

    /// Queue one transition per condition group for linking.
    fn emit(&mut self, event: &TokenEvent, session: &mut Session<'_>) -> Result<()> {
        let (Some(layer), Some(machine)) = (self.scope.layer, self.scope.state_machine) else {
            return Err(out_of_scope(event, "a transition"));
        };
        let home = match self.scope.state {
            Some(state) => Home::State(state),
            None if self.any => Home::Any(machine),
            None => Home::Entry(machine),
        };
        let target = match self.goto.take() {
            Some(Goto::Exit) => Target::Exit,
            Some(Goto::Relative(name)) => Target::Node(self.scope.path.join(name)),
            Some(Goto::Absolute(segments)) => {
                let root = self.scope.path.segments().iter().take(1).map(String::as_str);
                Target::Node(Path::from_segments(root).concat(&Path::from_segments(segments)))
            }
            None => match self.scope.state {
                Some(state) => {
                    let name = session.controller.state(state).name.clone();
                    Target::Node(self.scope.path.join(name))
                }
                None => Target::Missing,
            },
        };

        let groups = match std::mem::take(&mut self.groups) {
            groups if groups.is_empty() => vec![Vec::new()],
            groups => groups,
        };
        let (span, position) = self.start.unwrap_or((event.span(), event.position()));
        trace!(groups = groups.len(), target:? = target; "Transition statement");
        for conditions in groups {
            let mut transition = self.transition.clone();
            transition.conditions = conditions;
            session.pending.push(PendingTransition {
                transition,
                target: target.clone(),
                home,
                owner: machine,
                layer,
                hint: self.scope.hint.clone(),
                span,
                position,
            });
        }
        Ok(())
    }
}

impl<'h> Rule<Scope, Session<'h>> for ConditionRule {
    fn hint(&self) -> &str {
        "transition"
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
        if self.start.is_none() {
            self.start = Some((event.span(), event.position()));
        }
        loop {
            match self.step(event, session, control)? {
                Step::Done => return Ok(()),
                Step::Again => continue,
            }
        }
    }
}
