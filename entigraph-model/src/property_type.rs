use serde::Serialize;

use crate::definition::TypeDefinition;
use crate::value::{parse_float, DateValue, TypedValue, Value};

/// How raw string values of a type are cast.
///
/// Derived from the type name once at construction so casting never
/// compares strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Number,
    Date,
    Entity,
    /// Any other type; values pass through as strings.
    Text,
}

impl TypeKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" => Self::Number,
            "date" => Self::Date,
            "entity" => Self::Entity,
            _ => Self::Text,
        }
    }
}

/// A value kind and its casting rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyType {
    name: String,
    kind: TypeKind,
    label: Option<String>,
    plural: Option<String>,
    description: Option<String>,
    group: Option<String>,
    matchable: bool,
    pivot: bool,
    max_length: Option<usize>,
}

impl PropertyType {
    pub(crate) fn new(name: &str, definition: &TypeDefinition) -> Self {
        Self {
            name: name.to_owned(),
            kind: TypeKind::from_name(name),
            label: definition.label.clone(),
            plural: definition.plural.clone(),
            description: definition.description.clone(),
            group: definition.group.clone(),
            matchable: definition.matchable,
            pivot: definition.pivot,
            max_length: definition.max_length,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Human label, falling back to the type name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn plural(&self) -> &str {
        self.plural.as_deref().unwrap_or_else(|| self.label())
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Name under which values of this type are grouped across properties.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn matchable(&self) -> bool {
        self.matchable
    }

    #[must_use]
    pub fn pivot(&self) -> bool {
        self.pivot
    }

    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.kind == TypeKind::Entity
    }

    /// Casts a stored value. Nested entities pass through unchanged.
    #[must_use]
    pub fn cast(&self, value: &Value) -> TypedValue {
        match value {
            Value::String(raw) => self.cast_str(raw),
            Value::Entity(entity) => TypedValue::Entity(entity.clone()),
        }
    }

    /// Casts a raw string. Never fails: unparseable numbers become `NaN` and
    /// unparseable dates become [`DateValue::INVALID`].
    #[must_use]
    pub fn cast_str(&self, raw: &str) -> TypedValue {
        match self.kind {
            TypeKind::Number => TypedValue::Number(parse_float(raw)),
            // A bare year is a partial date, not a timestamp.
            TypeKind::Date if raw.chars().count() == 4 => TypedValue::String(raw.to_owned()),
            TypeKind::Date => TypedValue::Date(DateValue::parse(raw)),
            TypeKind::Entity | TypeKind::Text => TypedValue::String(raw.to_owned()),
        }
    }
}
