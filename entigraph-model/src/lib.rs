//! Typed entity graph model.
//!
//! A [`Model`] is built once from a declarative [`ModelDefinition`] and owns
//! every [`Schema`] and [`PropertyType`] for its whole lifetime:
//! - [`PropertyType`]: a value kind (`string`, `number`, `date`, `entity`, ...) with its casting rule
//! - [`Property`]: a typed attribute slot, unique across the model by qualified name
//! - [`Schema`]: an entity type with an inheritable property set
//! - [`Entity`]: a read-only proxy over one raw JSON record, bound to a model
//!
//! Every read on an entity flows Schema -> Property -> PropertyType, so raw
//! JSON strings come back as numbers, dates or nested entities. Casting is
//! total: garbage input degrades to `NaN` or an invalid-date sentinel instead
//! of failing. [`get_primitive_value`] is the single display-casting entry point.
//!
//! The model performs no I/O. Records are fetched by the caller and handed in
//! as [`EntityDatum`] values.

mod definition;
mod entity;
mod model;
mod property;
mod property_type;
mod schema;
mod value;

pub use definition::{
    EdgeDefinition, ModelDefinition, PropertyDefinition, SchemaDefinition, TypeDefinition,
};
pub use entity::{Entity, EntityDatum, EntityInput, PropertyRef, RawValue, RawValues};
pub use model::{Model, TypeRef};
pub use property::Property;
pub use property_type::{PropertyType, TypeKind};
pub use schema::{Edge, Schema, SchemaRef};
pub use value::{
    get_primitive_value, parse_float, DateValue, Primitive, TypedValue, Value, MAX_CAPTION_DEPTH,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural problems found while constructing a [`Model`].
///
/// Any of these aborts construction; no partially-built model is exposed.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("schema {schema} extends undeclared schema {parent}")]
    UnknownParent { schema: String, parent: String },

    #[error("property {property} references undeclared type {type_name}")]
    UnknownType { property: String, type_name: String },

    #[error("property {property} has undeclared range {range}")]
    UnknownRange { property: String, range: String },

    #[error("cyclic inheritance through schema {schema}")]
    CyclicInheritance { schema: String },

    #[error("malformed model definition: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors that can occur in model operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("model definition error: {0}")]
    ModelDefinition(#[from] DefinitionError),

    #[error("no such schema: {}", .name.as_deref().unwrap_or("<none>"))]
    UnknownSchema { name: Option<String> },

    #[error("property {property} does not exist on schema {schema}")]
    UnknownProperty { schema: String, property: String },

    #[error("malformed entity record: {0}")]
    Serialization(#[from] serde_json::Error),
}
