//! The document root: parameter declarations and layers.

use log::info;

use animalab_core::controller::ParameterKind;

use crate::{
    error::Result,
    grammar::{Ctl, Scope, Session, parameter::ParameterRule, state_machine::StateMachineRule},
    host::ObjectRef,
    linker,
    stack::{Rule, TokenEvent},
    tokens::TokenKind,
};

/// The bottom of the rule stack.
#[derive(Debug, Default)]
pub(crate) struct DocumentRule {
    scope: Scope,
}

impl DocumentRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'h> Rule<Scope, Session<'h>> for DocumentRule {
    fn hint(&self) -> &str {
        "document"
    }

    fn context(&self) -> Option<&Scope> {
        Some(&self.scope)
    }

    fn on_attach(&mut self, _inherited: Option<&Scope>, session: &mut Session<'h>) -> Result<()> {
        let name = session.controller.name().to_string();
        session.persist(&[], ObjectRef::Controller, &name);
        Ok(())
    }

    fn on_token(
        &mut self,
        event: &TokenEvent,
        _session: &mut Session<'h>,
        control: &mut Ctl<'h>,
    ) -> Result<()> {
        if event.is_keyword("layer") {
            return control.attach(StateMachineRule::layer());
        }
        if event.kind() == TokenKind::Identifier && event.text().parse::<ParameterKind>().is_ok() {
            return control.attach_with_token(ParameterRule::new());
        }
        Err(event.unexpected("`layer` or a parameter declaration"))
    }

    fn on_detach(&mut self, session: &mut Session<'h>) -> Result<()> {
        linker::link_sync_layers(session);
        info!(
            parameters = session.controller.parameters().len(),
            layers = session.controller.layers().len();
            "Document closed"
        );
        Ok(())
    }
}
