use std::fmt;
use std::sync::Arc;

use crate::definition::PropertyDefinition;
use crate::property_type::PropertyType;
use crate::value::{TypedValue, Value};

/// A named, typed attribute slot declared by one schema.
///
/// Identity is the qualified name `"<Schema>:<name>"`, unique across the
/// whole model. Inheriting schemata share the same `Arc<Property>`.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    qname: String,
    schema: String,
    property_type: Arc<PropertyType>,
    label: Option<String>,
    description: Option<String>,
    hidden: bool,
    stub: bool,
    matchable: Option<bool>,
    range: Option<String>,
    reverse: Option<String>,
    multiple: bool,
}

impl Property {
    pub(crate) fn new(
        schema: &str,
        name: &str,
        definition: &PropertyDefinition,
        property_type: Arc<PropertyType>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            qname: Self::qualified_name(schema, name),
            schema: schema.to_owned(),
            property_type,
            label: definition.label.clone(),
            description: definition.description.clone(),
            hidden: definition.hidden,
            stub: definition.stub,
            matchable: definition.matchable,
            range: definition.range.clone(),
            reverse: definition.reverse.clone(),
            multiple: definition.multiple,
        }
    }

    /// Builds the model-wide key of a property.
    #[must_use]
    pub fn qualified_name(schema: &str, name: &str) -> String {
        format!("{schema}:{name}")
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn qname(&self) -> &str {
        &self.qname
    }

    /// Name of the declaring schema.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    #[must_use]
    pub fn property_type(&self) -> &Arc<PropertyType> {
        &self.property_type
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// Stub properties are the reverse side of an entity reference and are
    /// not stored on the entity itself.
    #[must_use]
    pub fn stub(&self) -> bool {
        self.stub
    }

    #[must_use]
    pub fn matchable(&self) -> bool {
        self.matchable.unwrap_or_else(|| self.property_type.matchable())
    }

    #[must_use]
    pub fn range(&self) -> Option<&str> {
        self.range.as_deref()
    }

    #[must_use]
    pub fn reverse(&self) -> Option<&str> {
        self.reverse.as_deref()
    }

    /// Whether the property is declared to hold several values.
    #[must_use]
    pub fn multiple(&self) -> bool {
        self.multiple
    }

    #[must_use]
    pub fn cast(&self, value: &Value) -> TypedValue {
        self.property_type.cast(value)
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.qname == other.qname
    }
}

impl Eq for Property {}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qname)
    }
}
