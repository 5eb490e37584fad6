//! Behaviour records.
//!
//! ```text
//! Game.Footsteps {
//!     volume = 0.8;
//!     surface = stone;
//!     layers = 1, 4;
//!     offset = { x = 0; y = 0.5; };
//!     tags = [ "left"; "right"; ];
//! };
//! ```
//!
//! The host describes the record's fields; values are shaped and coerced
//! by that schema.

use log::debug;

use animalab_core::{
    behaviour::{BehaviourRecord, FieldKind, Record, Schema, Value},
    controller::BehaviourId,
    resource::ResourceKind,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    grammar::{Ctl, Scope, Session, name_of, out_of_scope, type_name::TypeName},
    host::ObjectRef,
    stack::{Rule, TokenEvent},
    tokens::TokenKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    TypeName,
    Field,
    Operator,
    Value,
    AfterValue,
    End,
}

/// The kind of the field or element addressed by `path`.
fn kind_at<'a>(schema: &'a Schema, path: &[usize]) -> Option<&'a FieldKind> {
    let (first, rest) = path.split_first()?;
    let mut kind = schema.fields().get(*first)?.kind();
    for index in rest {
        kind = match kind {
            FieldKind::Record(schema) => schema.fields().get(*index)?.kind(),
            FieldKind::Array(element) => element,
            _ => return None,
        };
    }
    Some(kind)
}

/// The value addressed by `path`.
fn value_at<'a>(record: &'a mut Record, path: &[usize]) -> Option<&'a mut Value> {
    let (first, rest) = path.split_first()?;
    let mut value = record.value_at_mut(*first)?;
    for index in rest {
        value = match value {
            Value::Record(record) => record.value_at_mut(*index)?,
            Value::Array(items) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(value)
}

fn invalid_value(event: &TokenEvent, expected: &str) -> Diagnostic {
    Diagnostic::error(format!("invalid value `{}`", event.text()))
        .with_code(ErrorCode::E103)
        .with_label(event.span(), format!("expected {expected}"))
        .with_position(event.position())
}

#[derive(Debug)]
pub(crate) struct BehaviourRule {
    expect: Expect,
    scope: Scope,
    type_name: TypeName,
    schema: Schema,
    record: Option<BehaviourId>,
    /// Field and element indices from the record down to the current value.
    path: Vec<usize>,
}

impl BehaviourRule {
    pub fn new() -> Self {
        Self {
            expect: Expect::TypeName,
            scope: Scope::default(),
            type_name: TypeName::default(),
            schema: Schema::default(),
            record: None,
            path: Vec::new(),
        }
    }

    fn value_mut<'s>(&self, session: &'s mut Session<'_>) -> Option<&'s mut Value> {
        let id = self.record?;
        value_at(&mut session.controller.behaviour_mut(id).fields, &self.path)
    }

    fn kind(&self) -> Option<&FieldKind> {
        kind_at(&self.schema, &self.path)
    }

    /// Resolve the type and attach an empty record to the owner.
    fn open(&mut self, event: &TokenEvent, session: &mut Session<'_>) -> Result<()> {
        let name = self.type_name.as_str();
        let schema = session
            .host
            .resolve_behaviour_type(name)
            .and_then(|handle| session.host.introspect_schema(handle))
            .cloned()
            .ok_or_else(|| {
                Diagnostic::error(format!("unknown behaviour type `{name}`"))
                    .with_code(ErrorCode::E101)
                    .with_label(event.span(), "record starts here")
                    .with_position(event.position())
            })?;
        let id = session
            .controller
            .add_behaviour(BehaviourRecord::new(name, schema.clone()));
        match (self.scope.state, self.scope.state_machine) {
            (Some(state), _) => session.controller.state_mut(state).behaviours.push(id),
            (None, Some(machine)) => session
                .controller
                .state_machine_mut(machine)
                .behaviours
                .push(id),
            (None, None) => return Err(out_of_scope(event, "a behaviour")),
        }
        let short_name = name.rsplit(['.', ',', ':']).next().unwrap_or(name).to_string();
        session.persist(&self.scope.hint, ObjectRef::Behaviour(id), &short_name);
        debug!(behaviour = name, fields = schema.fields().len(); "Behaviour record opened");
        self.schema = schema;
        self.record = Some(id);
        Ok(())
    }

    fn on_field(&mut self, event: &TokenEvent, session: &mut Session<'_>) -> Result<()> {
        if event.is_symbol('}') {
            self.expect = if self.path.is_empty() {
                Expect::End
            } else {
                Expect::AfterValue
            };
            return Ok(());
        }
        let name = name_of(event).ok_or_else(|| event.unexpected("a field name or `}`"))?;
        let fields = if self.path.is_empty() {
            Some(&self.schema)
        } else {
            match self.kind() {
                Some(FieldKind::Record(schema)) => Some(schema),
                _ => None,
            }
        };
        let index = fields
            .and_then(|schema| schema.field(name))
            .map(|(index, _)| index)
            .ok_or_else(|| {
                Diagnostic::error(format!(
                    "unknown field `{name}` in `{}`",
                    self.type_name.as_str()
                ))
                .with_code(ErrorCode::E102)
                .with_label(event.span(), "not a field of this record")
                .with_position(event.position())
            })?;
        self.path.push(index);
        if matches!(self.kind(), Some(FieldKind::Mask(_))) {
            if let Some(value) = self.value_mut(session) {
                *value = Value::Mask(0);
            }
        }
        self.expect = Expect::Operator;
        Ok(())
    }

    fn on_value(&mut self, event: &TokenEvent, session: &mut Session<'_>) -> Result<()> {
        let kind = self.kind().cloned().ok_or_else(|| event.unexpected("a field"))?;

        if event.is_symbol(']') && self.in_array() {
            self.path.pop();
            if let Some(Value::Array(items)) = self.value_mut(session) {
                items.pop();
            }
            self.expect = Expect::AfterValue;
            return Ok(());
        }

        let value = match &kind {
            FieldKind::Record(_) if event.is_symbol('{') => {
                self.expect = Expect::Field;
                return Ok(());
            }
            FieldKind::Array(element) if event.is_symbol('[') => {
                let element = Value::default_for(element);
                if let Some(Value::Array(items)) = self.value_mut(session) {
                    items.push(element);
                    self.path.push(items.len() - 1);
                }
                return Ok(());
            }
            FieldKind::Mask(names) => {
                let bits = Self::mask_bits(event, names)?;
                if let Some(Value::Mask(mask)) = self.value_mut(session) {
                    *mask |= bits;
                }
                self.expect = Expect::AfterValue;
                return Ok(());
            }
            FieldKind::Object => match name_of(event) {
                Some(reference) if reference == "null" => Some(Value::Object(None)),
                Some(reference) => {
                    let asset = session.host.resolve_resource(reference, ResourceKind::Object);
                    if asset.is_none() {
                        debug!(reference; "Object reference not resolved");
                    }
                    asset.map(|asset| Value::Object(Some(asset)))
                }
                None => return Err(invalid_value(event, "an object reference or `null`")),
            },
            kind => Some(Self::scalar(event, kind)?),
        };
        if let (Some(value), Some(slot)) = (value, self.value_mut(session)) {
            *slot = value;
        }
        self.expect = Expect::AfterValue;
        Ok(())
    }

    fn scalar(event: &TokenEvent, kind: &FieldKind) -> Result<Value> {
        let token = event.token();
        let value = match kind {
            FieldKind::Bool => {
                if event.is_keyword("true") {
                    Some(Value::Bool(true))
                } else if event.is_keyword("false") {
                    Some(Value::Bool(false))
                } else {
                    token.number().map(|n| Value::Bool(n != 0.0))
                }
            }
            FieldKind::Integer => token.as_i64().map(Value::Integer),
            FieldKind::Float => token.number().map(Value::Float),
            FieldKind::String => name_of(event).map(|text| Value::String(text.to_string())),
            FieldKind::Enum(names) => match event.kind() {
                TokenKind::Number => token
                    .as_i64()
                    .and_then(|index| usize::try_from(index).ok())
                    .filter(|index| *index < names.len())
                    .map(Value::Enum),
                _ => names
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(event.text()))
                    .map(Value::Enum),
            },
            FieldKind::Mask(_) | FieldKind::Object | FieldKind::Record(_) | FieldKind::Array(_) => {
                None
            }
        };
        value.ok_or_else(|| invalid_value(event, &format!("a {}", kind_label(kind))))
    }

    fn mask_bits(event: &TokenEvent, names: &[String]) -> Result<u64> {
        match event.kind() {
            TokenKind::Number => event
                .token()
                .as_i64()
                .and_then(|bits| u64::try_from(bits).ok())
                .ok_or_else(|| invalid_value(event, "a mask bit pattern")),
            _ => names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(event.text()))
                .filter(|bit| *bit < 64)
                .map(|bit| 1u64 << bit)
                .ok_or_else(|| invalid_value(event, "a mask bit name")),
        }
    }

    /// Whether the current value is an element of an array.
    fn in_array(&self) -> bool {
        let parent = &self.path[..self.path.len().saturating_sub(1)];
        !parent.is_empty() && matches!(kind_at(&self.schema, parent), Some(FieldKind::Array(_)))
    }

    fn on_after_value(&mut self, event: &TokenEvent, session: &mut Session<'_>) -> Result<()> {
        if event.is_symbol(',') && matches!(self.kind(), Some(FieldKind::Mask(_))) {
            self.expect = Expect::Value;
            return Ok(());
        }
        if !event.is_symbol(';') {
            return Err(event.unexpected("`;`"));
        }
        self.path.pop();
        let element = match self.kind() {
            Some(FieldKind::Array(element)) => Some(Value::default_for(element)),
            _ => None,
        };
        match element {
            Some(element) => {
                if let Some(Value::Array(items)) = self.value_mut(session) {
                    items.push(element);
                    self.path.push(items.len() - 1);
                }
                self.expect = Expect::Value;
            }
            None => self.expect = Expect::Field,
        }
        Ok(())
    }
}

fn kind_label(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Bool => "boolean",
        FieldKind::Integer => "integer",
        FieldKind::Float => "number",
        FieldKind::String => "string",
        FieldKind::Enum(_) => "enum variant",
        FieldKind::Mask(_) => "mask",
        FieldKind::Object => "object reference",
        FieldKind::Record(_) => "record",
        FieldKind::Array(_) => "array",
    }
}

impl<'h> Rule<Scope, Session<'h>> for BehaviourRule {
    fn hint(&self) -> &str {
        "behaviour"
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
            Expect::TypeName => {
                if event.is_symbol('{') && !self.type_name.is_empty() {
                    self.open(event, session)?;
                    self.expect = Expect::Field;
                } else if !self.type_name.push(event) {
                    return Err(event.unexpected("a behaviour type name followed by `{`"));
                }
            }
            Expect::Field => self.on_field(event, session)?,
            Expect::Operator if event.is_symbol('=') => self.expect = Expect::Value,
            Expect::Operator => return Err(event.unexpected("`=`")),
            Expect::Value => self.on_value(event, session)?,
            Expect::AfterValue => self.on_after_value(event, session)?,
            Expect::End if event.is_symbol(';') => return control.detach(),
            Expect::End => return Err(event.unexpected("`;`")),
        }
        Ok(())
    }
}
