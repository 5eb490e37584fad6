//! Parameter declarations: `<kind> <name> [= <literal>];`.

use log::debug;

use animalab_core::controller::{Parameter, ParameterKind, ParameterValue};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    grammar::{Ctl, Scope, Session, name_of},
    span::{Position, Span},
    stack::{Rule, TokenEvent},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Kind,
    Name,
    Operator,
    Value,
    End,
}

#[derive(Debug)]
pub(crate) struct ParameterRule {
    expect: Expect,
    parameter: Option<Parameter>,
    span: Span,
    position: Position,
}

impl ParameterRule {
    pub fn new() -> Self {
        Self {
            expect: Expect::Kind,
            parameter: None,
            span: Span::default(),
            position: Position::default(),
        }
    }

    /// Apply a literal to the default value. Literals that do not fit the
    /// parameter's kind are ignored.
    fn assign(parameter: &mut Parameter, event: &TokenEvent) {
        let value = match parameter.kind() {
            ParameterKind::Bool if event.is_keyword("true") => Some(ParameterValue::Bool(true)),
            ParameterKind::Bool if event.is_keyword("false") => Some(ParameterValue::Bool(false)),
            ParameterKind::Trigger if event.is_keyword("true") => {
                Some(ParameterValue::Trigger(true))
            }
            ParameterKind::Float => event.token().as_f32().map(ParameterValue::Float),
            ParameterKind::Int => event
                .token()
                .as_i64()
                .and_then(|value| i32::try_from(value).ok())
                .map(ParameterValue::Int),
            _ => None,
        };
        match value {
            Some(value) => parameter.default = value,
            None => debug!(parameter = parameter.name.as_str(), literal = event.text(); "Ignore mismatched default"),
        }
    }

    fn declare(&mut self, session: &mut Session<'_>) {
        let Some(parameter) = self.parameter.take() else {
            return;
        };
        if parameter.name.is_empty() {
            return;
        }
        let name = parameter.name.clone();
        if session.controller.add_parameter(parameter) {
            debug!(parameter = name.as_str(); "Parameter declared");
            return;
        }
        let diagnostic = Diagnostic::warning(format!("duplicate parameter `{name}` ignored"))
            .with_code(ErrorCode::E200)
            .with_label(self.span, "declared again here")
            .with_position(self.position);
        session.warn(diagnostic);
    }
}

impl<'h> Rule<Scope, Session<'h>> for ParameterRule {
    fn hint(&self) -> &str {
        "parameter"
    }

    fn on_token(
        &mut self,
        event: &TokenEvent,
        session: &mut Session<'h>,
        control: &mut Ctl<'h>,
    ) -> Result<()> {
        match self.expect {
            Expect::Kind => {
                let kind = event
                    .text()
                    .parse::<ParameterKind>()
                    .map_err(|_| event.unexpected("a parameter type"))?;
                self.parameter = Some(Parameter::new("", kind));
                self.expect = Expect::Name;
            }
            Expect::Name if event.is_symbol(';') => return control.detach(),
            Expect::Name => {
                let name = name_of(event).ok_or_else(|| event.unexpected("a parameter name"))?;
                if let Some(parameter) = self.parameter.as_mut() {
                    parameter.name = name.to_string();
                }
                self.span = event.span();
                self.position = event.position();
                self.expect = Expect::Operator;
            }
            Expect::Operator if event.is_symbol('=') => self.expect = Expect::Value,
            Expect::Operator | Expect::End if event.is_symbol(';') => {
                self.declare(session);
                return control.detach();
            }
            Expect::Value => {
                if let Some(parameter) = self.parameter.as_mut() {
                    Self::assign(parameter, event);
                }
                self.expect = Expect::End;
            }
            Expect::Operator => return Err(event.unexpected("`=` or `;`")),
            Expect::End => return Err(event.unexpected("`;`")),
        }
        Ok(())
    }
}
