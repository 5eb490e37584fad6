//! Behaviour records.

use animalab_core::behaviour::{BehaviourRecord, FieldKind, Record, Schema, Value};

use super::{
    Writer,
    format::{format_name, format_string, is_bare},
};

/// A type name as identifiers joined by `.`, `,` or `:` when every part
/// allows it, quoted otherwise.
fn type_name(name: &str) -> String {
    if name.split(['.', ',', ':']).all(is_bare) {
        name.to_string()
    } else {
        format_string(name)
    }
}

/// A variant or bit name, or its index when a name earlier in `names`
/// would be matched instead.
fn keyword(names: &[String], index: usize) -> String {
    match names.get(index) {
        Some(name)
            if names
                .iter()
                .position(|other| other.eq_ignore_ascii_case(name))
                == Some(index) =>
        {
            format_name(name).into_owned()
        }
        _ => index.to_string(),
    }
}

fn mask(names: &[String], bits: u64) -> String {
    let mut parts = Vec::new();
    let mut rest = bits;
    for index in 0..names.len().min(64) {
        let bit = 1u64 << index;
        if bits & bit != 0 {
            let part = keyword(names, index);
            if part.parse::<u64>().is_err() {
                parts.push(part);
                rest &= !bit;
            }
        }
    }
    if rest != 0 || parts.is_empty() {
        parts.push(rest.to_string());
    }
    parts.join(", ")
}

/// A value that fits on one line.
fn scalar(value: &Value, kind: &FieldKind) -> String {
    match (value, kind) {
        (Value::Bool(value), _) => value.to_string(),
        (Value::Integer(value), _) => value.to_string(),
        (Value::Float(value), _) => format!("{value}"),
        (Value::String(text), _) => format_string(text),
        (Value::Enum(index), FieldKind::Enum(names)) => keyword(names, *index),
        (Value::Enum(index), _) => index.to_string(),
        (Value::Mask(bits), FieldKind::Mask(names)) => mask(names, *bits),
        (Value::Mask(bits), _) => bits.to_string(),
        (Value::Object(Some(asset)), _) => format_string(asset.reference()),
        (Value::Object(None), _) => "null".into(),
        (Value::Record(_) | Value::Array(_), _) => String::new(),
    }
}

impl Writer<'_> {
    pub(super) fn behaviour(&mut self, record: &BehaviourRecord, depth: usize) {
        self.line(depth, format!("{} {{", type_name(record.type_name())));
        self.record(&record.fields, record.schema(), depth + 1);
        self.line(depth, "};");
    }

    fn record(&mut self, record: &Record, schema: &Schema, depth: usize) {
        for (descriptor, (name, value)) in schema.fields().iter().zip(record.fields()) {
            self.value(Some(name), value, descriptor.kind(), depth);
        }
    }

    /// One field, or one array element when `name` is `None`.
    fn value(&mut self, name: Option<&str>, value: &Value, kind: &FieldKind, depth: usize) {
        let prefix = name
            .map(|name| format!("{} = ", format_name(name)))
            .unwrap_or_default();
        match (value, kind) {
            (Value::Record(record), FieldKind::Record(schema)) => {
                self.line(depth, format!("{prefix}{{"));
                self.record(record, schema, depth + 1);
                self.line(depth, "};");
            }
            (Value::Array(items), FieldKind::Array(element)) => {
                self.line(depth, format!("{prefix}["));
                for item in items {
                    self.value(None, item, element, depth + 1);
                }
                self.line(depth, "];");
            }
            _ => self.line(depth, format!("{prefix}{};", scalar(value, kind))),
        }
    }
}
