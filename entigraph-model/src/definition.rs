use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The declarative document a [`Model`](crate::Model) is built from.
///
/// Both maps keep document order, which becomes the registration order of
/// schemata and types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDefinition {
    #[serde(default)]
    pub schemata: IndexMap<String, SchemaDefinition>,
    #[serde(default)]
    pub types: IndexMap<String, TypeDefinition>,
}

/// Declares one entity type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Names of parent schemata, in precedence order.
    pub extends: Vec<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub matchable: bool,
    pub featured: Vec<String>,
    pub required: Vec<String>,
    /// Property names consulted, in order, to build an entity caption.
    pub caption: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeDefinition>,
    pub properties: IndexMap<String, PropertyDefinition>,
}

/// Marks a schema as a relationship between two entity-valued properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub caption: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub directed: bool,
}

/// Declares one property on a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDefinition {
    /// Name of the property type. Defaults to `"string"`.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub hidden: bool,
    pub stub: bool,
    /// Overrides the type's matchable flag when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchable: Option<bool>,
    /// Target schema of an entity-typed property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Name of the inverse property on the range schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<String>,
    pub multiple: bool,
}

impl Default for PropertyDefinition {
    fn default() -> Self {
        Self {
            type_name: "string".into(),
            label: None,
            description: None,
            hidden: false,
            stub: false,
            matchable: None,
            range: None,
            reverse: None,
            multiple: true,
        }
    }
}

impl PropertyDefinition {
    /// Shorthand for a property of the given type with default metadata.
    pub fn of_type(type_name: &str) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Shorthand for an entity-reference property pointing at `range`.
    pub fn entity(range: &str) -> Self {
        Self {
            type_name: "entity".into(),
            range: Some(range.into()),
            ..Self::default()
        }
    }
}

/// Declares one property type. Everything beyond the name is descriptive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub matchable: bool,
    pub pivot: bool,
    #[serde(alias = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

fn default_true() -> bool {
    true
}
