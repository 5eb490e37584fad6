//! Behaviour records and the schemas that describe them.
//!
//! A behaviour record is an attached, type-named bag of field values. The
//! core has no static knowledge of record types: the host supplies a
//! [`SchemaRegistry`] mapping qualified type names to ordered field
//! descriptors, and the parser shapes each record from its schema.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::resource::AssetRef;

/// The type of a single field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Bool,
    Integer,
    Float,
    String,
    /// Variant names in index order.
    Enum(Vec<String>),
    /// Bit names, index `i` naming bit `1 << i`.
    Mask(Vec<String>),
    /// A reference to a host object, or null.
    Object,
    Record(Schema),
    Array(Box<FieldKind>),
}

/// A named field of a record schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// Ordered field descriptors of a record type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Schema {
    #[serde(default)]
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Finds a field by exact name, returning its index and descriptor.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.name == name)
    }

    /// A record holding the zero value of every field.
    pub fn default_record(&self) -> Record {
        Record {
            fields: self
                .fields
                .iter()
                .map(|field| (field.name.clone(), Value::default_for(&field.kind)))
                .collect(),
        }
    }
}

/// Opaque handle to a type known to a [`SchemaRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(usize);

/// Mapping from qualified type names to schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any earlier schema with the same name.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema) -> TypeHandle {
        let (index, _) = self.types.insert_full(name.into(), schema);
        TypeHandle(index)
    }

    pub fn resolve(&self, qualified_name: &str) -> Option<TypeHandle> {
        self.types.get_index_of(qualified_name).map(TypeHandle)
    }

    pub fn schema(&self, handle: TypeHandle) -> Option<&Schema> {
        self.types.get_index(handle.0).map(|(_, schema)| schema)
    }

    pub fn name(&self, handle: TypeHandle) -> Option<&str> {
        self.types.get_index(handle.0).map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Variant index into the field's [`FieldKind::Enum`] names.
    Enum(usize),
    Mask(u64),
    Object(Option<AssetRef>),
    Record(Record),
    Array(Vec<Value>),
}

impl Value {
    /// The zero value for a field kind.
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Bool => Self::Bool(false),
            FieldKind::Integer => Self::Integer(0),
            FieldKind::Float => Self::Float(0.0),
            FieldKind::String => Self::String(String::new()),
            FieldKind::Enum(_) => Self::Enum(0),
            FieldKind::Mask(_) => Self::Mask(0),
            FieldKind::Object => Self::Object(None),
            FieldKind::Record(schema) => Self::Record(schema.default_record()),
            FieldKind::Array(_) => Self::Array(Vec::new()),
        }
    }
}

/// Field values of a record, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|(_, value)| value)
    }

    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.fields.get_mut(index).map(|(_, value)| value)
    }
}

/// An instance of a host behaviour type attached to a state or state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviourRecord {
    type_name: String,
    schema: Schema,
    pub fields: Record,
}

impl BehaviourRecord {
    /// Creates a record with every field at its zero value.
    pub fn new(type_name: impl Into<String>, schema: Schema) -> Self {
        let fields = schema.default_record();
        Self {
            type_name: type_name.into(),
            schema,
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footstep_schema() -> Schema {
        Schema::new(vec![
            FieldDescriptor::new("volume", FieldKind::Float),
            FieldDescriptor::new(
                "surface",
                FieldKind::Enum(vec!["grass".into(), "stone".into()]),
            ),
            FieldDescriptor::new(
                "offset",
                FieldKind::Record(Schema::new(vec![
                    FieldDescriptor::new("x", FieldKind::Float),
                    FieldDescriptor::new("y", FieldKind::Float),
                ])),
            ),
            FieldDescriptor::new("tags", FieldKind::Array(Box::new(FieldKind::String))),
        ])
    }

    #[test]
    fn test_default_record_follows_schema() {
        let record = BehaviourRecord::new("Game.Footsteps", footstep_schema());
        let names: Vec<_> = record.fields.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["volume", "surface", "offset", "tags"]);
        assert_eq!(record.fields.get("volume"), Some(&Value::Float(0.0)));
        assert_eq!(record.fields.get("tags"), Some(&Value::Array(Vec::new())));
        match record.fields.get("offset") {
            Some(Value::Record(inner)) => assert_eq!(inner.fields().len(), 2),
            other => panic!("expected nested record, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_resolution() {
        let mut registry = SchemaRegistry::new();
        let handle = registry.register("Game.Footsteps", footstep_schema());
        assert_eq!(registry.resolve("Game.Footsteps"), Some(handle));
        assert_eq!(registry.resolve("Game.Missing"), None);
        assert_eq!(registry.name(handle), Some("Game.Footsteps"));
        assert_eq!(registry.schema(handle).map(|s| s.fields().len()), Some(4));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_schema_field_lookup() {
        let schema = footstep_schema();
        let (index, field) = schema.field("surface").unwrap();
        assert_eq!(index, 1);
        assert!(matches!(field.kind(), FieldKind::Enum(names) if names.len() == 2));
        assert!(schema.field("Surface").is_none());
    }
}
