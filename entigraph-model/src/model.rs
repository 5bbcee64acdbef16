use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::definition::{ModelDefinition, SchemaDefinition};
use crate::entity::{Entity, EntityInput};
use crate::property::Property;
use crate::property_type::PropertyType;
use crate::schema::{Schema, SchemaRef};
use crate::{DefinitionError, Error, Result};

/// The registry owning every schema and property type of one definition.
///
/// Immutable once constructed; share it as `Arc<Model>`. Entities keep an
/// `Arc` to their model, the model never references entities.
#[derive(Debug)]
pub struct Model {
    schemata: IndexMap<String, Arc<Schema>>,
    types: IndexMap<String, Arc<PropertyType>>,
    properties: IndexMap<String, Arc<Property>>,
}

/// A property type given either by name or as an already-resolved handle.
#[derive(Debug, Clone, Copy)]
pub enum TypeRef<'a> {
    Name(&'a str),
    Type(&'a Arc<PropertyType>),
}

impl<'a> From<&'a str> for TypeRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Arc<PropertyType>> for TypeRef<'a> {
    fn from(property_type: &'a Arc<PropertyType>) -> Self {
        Self::Type(property_type)
    }
}

impl Model {
    /// Builds a model: all property types first, then every schema after its
    /// parents. Parents may be declared after their children.
    ///
    /// Fails on undeclared parents, types or ranges and on inheritance cycles.
    pub fn new(definition: &ModelDefinition) -> std::result::Result<Self, DefinitionError> {
        let types: IndexMap<String, Arc<PropertyType>> = definition
            .types
            .iter()
            .map(|(name, def)| (name.clone(), Arc::new(PropertyType::new(name, def))))
            .collect();

        let mut linker = Linker {
            definition,
            types: &types,
            built: HashMap::with_capacity(definition.schemata.len()),
            visiting: HashSet::new(),
        };
        let mut schemata = IndexMap::with_capacity(definition.schemata.len());
        for (name, schema) in &definition.schemata {
            let linked = linker.link(name, schema)?;
            schemata.insert(name.clone(), linked);
        }

        // Last registration wins; the first-seen position is kept.
        let mut properties = IndexMap::new();
        for schema in schemata.values() {
            for prop in schema.get_properties() {
                properties.insert(prop.qname().to_owned(), prop);
            }
        }

        debug!(
            schemata = schemata.len(),
            types = types.len(),
            properties = properties.len(),
            "model constructed"
        );
        Ok(Self {
            schemata,
            types,
            properties,
        })
    }

    /// Parses a JSON definition document and builds the model from it.
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: ModelDefinition =
            serde_json::from_str(json).map_err(DefinitionError::from)?;
        Ok(Self::new(&definition)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let definition: ModelDefinition =
            serde_json::from_value(value).map_err(DefinitionError::from)?;
        Ok(Self::new(&definition)?)
    }

    /// Resolves a schema name, or returns an already-resolved schema as is.
    ///
    /// Missing and unknown names fail with [`Error::UnknownSchema`].
    pub fn get_schema<'a>(&self, schema: impl Into<SchemaRef<'a>>) -> Result<Arc<Schema>> {
        match schema.into() {
            SchemaRef::Schema(schema) => Ok(Arc::clone(schema)),
            SchemaRef::Name(name) => {
                self.schemata
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownSchema {
                        name: Some(name.to_owned()),
                    })
            }
            SchemaRef::Missing => Err(Error::UnknownSchema { name: None }),
        }
    }

    /// All schemata in registration order. Unlike [`Model::get_schema`] this
    /// never fails; anything that does not resolve is skipped.
    #[must_use]
    pub fn get_schemata(&self) -> Vec<Arc<Schema>> {
        self.schemata
            .keys()
            .map(|name| self.schemata.get(name))
            .filter(|candidate| Schema::is_schema(*candidate))
            .flatten()
            .cloned()
            .collect()
    }

    /// Every property across all schemata, one per qualified name.
    #[must_use]
    pub fn get_properties(&self) -> Vec<Arc<Property>> {
        self.properties.values().cloned().collect()
    }

    /// Looks up a property by qualified name (`"Schema:name"`).
    #[must_use]
    pub fn get_property(&self, qname: &str) -> Option<Arc<Property>> {
        self.properties.get(qname).cloned()
    }

    /// Resolves a property type. Unknown names yield `None` rather than an error.
    #[must_use]
    pub fn get_type<'a>(&self, property_type: impl Into<TypeRef<'a>>) -> Option<Arc<PropertyType>> {
        match property_type.into() {
            TypeRef::Type(property_type) => Some(Arc::clone(property_type)),
            TypeRef::Name(name) => self.types.get(name).cloned(),
        }
    }

    #[must_use]
    pub fn get_types(&self) -> Vec<Arc<PropertyType>> {
        self.types.values().cloned().collect()
    }

    /// Direct parents of a schema, in declaration order.
    pub fn get_parents<'a>(&self, schema: impl Into<SchemaRef<'a>>) -> Result<Vec<Arc<Schema>>> {
        let schema = self.get_schema(schema)?;
        Ok(schema
            .extends()
            .iter()
            .filter_map(|name| self.schemata.get(name))
            .cloned()
            .collect())
    }

    /// Every schema that extends the given one, directly or transitively.
    pub fn get_descendants<'a>(
        &self,
        schema: impl Into<SchemaRef<'a>>,
    ) -> Result<Vec<Arc<Schema>>> {
        let schema = self.get_schema(schema)?;
        Ok(self
            .schemata
            .values()
            .filter(|candidate| candidate.name() != schema.name() && candidate.is_a(&schema))
            .cloned()
            .collect())
    }

    /// Wraps a raw record as an entity bound to this model.
    ///
    /// An already-wrapped entity is returned as the very same `Arc`.
    pub fn get_entity(self: &Arc<Self>, input: impl Into<EntityInput>) -> Result<Arc<Entity>> {
        match input.into() {
            EntityInput::Entity(entity) => Ok(entity),
            EntityInput::Raw(datum) => Ok(Arc::new(Entity::new(Arc::clone(self), datum)?)),
        }
    }
}

/// Builds schemata depth-first so every parent exists before its children.
struct Linker<'a> {
    definition: &'a ModelDefinition,
    types: &'a IndexMap<String, Arc<PropertyType>>,
    built: HashMap<String, Arc<Schema>>,
    visiting: HashSet<String>,
}

impl<'a> Linker<'a> {
    fn link(
        &mut self,
        name: &str,
        definition: &'a SchemaDefinition,
    ) -> std::result::Result<Arc<Schema>, DefinitionError> {
        if let Some(schema) = self.built.get(name) {
            return Ok(Arc::clone(schema));
        }
        if !self.visiting.insert(name.to_owned()) {
            return Err(DefinitionError::CyclicInheritance {
                schema: name.to_owned(),
            });
        }

        let model_definition: &'a ModelDefinition = self.definition;
        let schemata = &model_definition.schemata;
        let mut parents = Vec::with_capacity(definition.extends.len());
        for parent in &definition.extends {
            let Some(parent_definition) = schemata.get(parent) else {
                return Err(DefinitionError::UnknownParent {
                    schema: name.to_owned(),
                    parent: parent.clone(),
                });
            };
            parents.push(self.link(parent, parent_definition)?);
        }

        let mut own = IndexMap::with_capacity(definition.properties.len());
        for (prop_name, prop) in &definition.properties {
            let Some(property_type) = self.types.get(&prop.type_name) else {
                return Err(DefinitionError::UnknownType {
                    property: Property::qualified_name(name, prop_name),
                    type_name: prop.type_name.clone(),
                });
            };
            if let Some(range) = prop.range.as_ref().filter(|r| !schemata.contains_key(*r)) {
                return Err(DefinitionError::UnknownRange {
                    property: Property::qualified_name(name, prop_name),
                    range: range.clone(),
                });
            }
            let property = Property::new(name, prop_name, prop, Arc::clone(property_type));
            own.insert(prop_name.clone(), Arc::new(property));
        }

        let schema = Arc::new(Schema::link(name, definition, own, &parents));
        self.visiting.remove(name);
        trace!(
            schema = name,
            parents = parents.len(),
            properties = schema.get_properties().len(),
            "linked schema"
        );
        self.built.insert(name.to_owned(), Arc::clone(&schema));
        Ok(schema)
    }
}
