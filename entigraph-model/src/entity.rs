use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::model::{Model, TypeRef};
use crate::property::Property;
use crate::schema::Schema;
use crate::value::{primitive_at_depth, Primitive, TypedValue, Value, MAX_CAPTION_DEPTH};
use crate::{Error, Result};

/// A raw entity record as delivered by the API layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDatum {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, RawValues>,
    /// Caption computed by the producer. Ignored on input, filled on output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referents: Vec<String>,
}

impl EntityDatum {
    pub fn new(id: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema: Some(schema.into()),
            ..Self::default()
        }
    }

    /// Appends a value to a property, keeping any values already present.
    #[must_use]
    pub fn with(mut self, property: &str, value: impl Into<RawValue>) -> Self {
        let slot = self
            .properties
            .entry(property.to_owned())
            .or_insert_with(|| RawValues::Many(Vec::new()));
        let mut values = std::mem::replace(slot, RawValues::Many(Vec::new())).into_vec();
        values.push(value.into());
        *slot = RawValues::Many(values);
        self
    }
}

/// One value or a list of values; records use both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValues {
    Many(Vec<RawValue>),
    One(RawValue),
}

impl RawValues {
    #[must_use]
    pub fn as_slice(&self) -> &[RawValue] {
        match self {
            Self::Many(values) => values,
            Self::One(value) => std::slice::from_ref(value),
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<RawValue> {
        match self {
            Self::Many(values) => values,
            Self::One(value) => vec![value],
        }
    }
}

/// A single raw JSON value: a scalar or a nested record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Entity(Box<EntityDatum>),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<EntityDatum> for RawValue {
    fn from(datum: EntityDatum) -> Self {
        Self::Entity(Box::new(datum))
    }
}

/// A raw record to wrap, or an entity that is already wrapped.
#[derive(Debug, Clone)]
pub enum EntityInput {
    Raw(EntityDatum),
    Entity(Arc<Entity>),
}

impl From<EntityDatum> for EntityInput {
    fn from(datum: EntityDatum) -> Self {
        Self::Raw(datum)
    }
}

impl From<Arc<Entity>> for EntityInput {
    fn from(entity: Arc<Entity>) -> Self {
        Self::Entity(entity)
    }
}

impl From<&Arc<Entity>> for EntityInput {
    fn from(entity: &Arc<Entity>) -> Self {
        Self::Entity(Arc::clone(entity))
    }
}

/// A property given by local name or as a resolved handle.
#[derive(Debug, Clone, Copy)]
pub enum PropertyRef<'a> {
    Name(&'a str),
    Property(&'a Arc<Property>),
}

impl<'a> From<&'a str> for PropertyRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for PropertyRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Arc<Property>> for PropertyRef<'a> {
    fn from(property: &'a Arc<Property>) -> Self {
        Self::Property(property)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    property: Arc<Property>,
    values: Vec<Value>,
}

/// A typed, read-only proxy over one raw record.
///
/// Values are stored per qualified property name. Nested records are wrapped
/// as entities of the same model when the proxy is built.
#[derive(Clone)]
pub struct Entity {
    model: Arc<Model>,
    schema: Arc<Schema>,
    id: String,
    slots: IndexMap<String, Slot>,
    datasets: Vec<String>,
    referents: Vec<String>,
}

impl Entity {
    /// Wraps `datum`. Fails if its schema is missing or unknown, or if it
    /// carries a property the schema does not have. Nulls and blank strings
    /// are dropped.
    pub fn new(model: Arc<Model>, datum: EntityDatum) -> Result<Self> {
        let schema = model.get_schema(datum.schema.as_deref())?;
        let mut slots: IndexMap<String, Slot> = IndexMap::new();

        for (name, raw) in datum.properties {
            let property = schema
                .get_property(&name)
                .cloned()
                .ok_or_else(|| Error::UnknownProperty {
                    schema: schema.name().to_owned(),
                    property: name.clone(),
                })?;
            let mut values = Vec::new();
            for raw in raw.into_vec() {
                values.push(match raw {
                    RawValue::Null => continue,
                    RawValue::Text(s) if s.trim().is_empty() => continue,
                    RawValue::Text(s) => Value::String(s),
                    RawValue::Number(n) => Value::String(n.to_string()),
                    RawValue::Bool(b) => Value::String(b.to_string()),
                    RawValue::Entity(nested) => Value::Entity(model.get_entity(*nested)?),
                });
            }
            if values.is_empty() {
                continue;
            }
            slots
                .entry(property.qname().to_owned())
                .or_insert_with(|| Slot {
                    property,
                    values: Vec::new(),
                })
                .values
                .extend(values);
        }

        Ok(Self {
            model,
            schema,
            id: datum.id,
            slots,
            datasets: datum.datasets,
            referents: datum.referents,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[must_use]
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    #[must_use]
    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    #[must_use]
    pub fn referents(&self) -> &[String] {
        &self.referents
    }

    fn resolve(&self, property: PropertyRef<'_>) -> Result<Arc<Property>> {
        let resolved = match property {
            PropertyRef::Name(name) => self.schema.get_property(name).cloned(),
            PropertyRef::Property(prop) => {
                self.schema.contains(prop).then(|| Arc::clone(prop))
            }
        };
        resolved.ok_or_else(|| Error::UnknownProperty {
            schema: self.schema.name().to_owned(),
            property: match property {
                PropertyRef::Name(name) => name.to_owned(),
                PropertyRef::Property(prop) => prop.qname().to_owned(),
            },
        })
    }

    fn values_of(&self, property: &Property) -> &[Value] {
        self.slots
            .get(property.qname())
            .map(|slot| slot.values.as_slice())
            .unwrap_or_default()
    }

    /// The stored values of a property; empty if it has none.
    pub fn get_property<'a>(&self, property: impl Into<PropertyRef<'a>>) -> Result<&[Value]> {
        let property = self.resolve(property.into())?;
        Ok(self.values_of(&property))
    }

    /// The values of a property cast through its type.
    pub fn get_typed_values<'a>(
        &self,
        property: impl Into<PropertyRef<'a>>,
    ) -> Result<Vec<TypedValue>> {
        let property = self.resolve(property.into())?;
        Ok(self
            .values_of(&property)
            .iter()
            .map(|value| property.cast(value))
            .collect())
    }

    pub fn get_first<'a>(&self, property: impl Into<PropertyRef<'a>>) -> Result<Option<&Value>> {
        Ok(self.get_property(property)?.first())
    }

    /// The values of a property reduced to display primitives.
    pub fn get_display_values<'a>(
        &self,
        property: impl Into<PropertyRef<'a>>,
    ) -> Result<Vec<Primitive>> {
        let property = self.resolve(property.into())?;
        Ok(self
            .values_of(&property)
            .iter()
            .map(|value| primitive_at_depth(&property, Some(value), 0))
            .collect())
    }

    /// True if the schema has the property and the entity holds a value for it.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.schema
            .get_property(name)
            .is_some_and(|prop| self.slots.contains_key(prop.qname()))
    }

    /// Properties holding at least one value, in schema order.
    #[must_use]
    pub fn get_properties(&self) -> Vec<Arc<Property>> {
        self.schema
            .get_properties()
            .into_iter()
            .filter(|prop| self.slots.contains_key(prop.qname()))
            .collect()
    }

    /// All values held by properties of the given type.
    #[must_use]
    pub fn get_type_values<'a>(&self, property_type: impl Into<TypeRef<'a>>) -> Vec<&Value> {
        let type_name = match property_type.into() {
            TypeRef::Name(name) => name,
            TypeRef::Type(property_type) => property_type.name(),
        };
        self.slots
            .values()
            .filter(|slot| slot.property.property_type().name() == type_name)
            .flat_map(|slot| slot.values.iter())
            .collect()
    }

    /// The first non-empty display value among the schema's caption
    /// properties, or the entity id. Unparseable numbers are skipped.
    #[must_use]
    pub fn get_caption(&self) -> String {
        self.caption_at_depth(0)
    }

    pub(crate) fn caption_at_depth(&self, depth: usize) -> String {
        if depth > MAX_CAPTION_DEPTH {
            warn!(entity = %self.id, depth, "caption recursion cut off");
            return self.id.clone();
        }
        for name in self.schema.caption_properties() {
            let Some(property) = self.schema.get_property(name) else {
                continue;
            };
            for value in self.values_of(property) {
                match primitive_at_depth(property, Some(value), depth) {
                    Primitive::Number(n) if n.is_nan() => continue,
                    primitive if primitive.is_empty() => continue,
                    primitive => return primitive.to_string(),
                }
            }
        }
        self.id.clone()
    }

    /// Converts back to the raw record shape, nested entities included.
    #[must_use]
    pub fn to_datum(&self) -> EntityDatum {
        let properties = self
            .slots
            .values()
            .map(|slot| {
                let values = slot
                    .values
                    .iter()
                    .map(|value| match value {
                        Value::String(s) => RawValue::Text(s.clone()),
                        Value::Entity(entity) => RawValue::Entity(Box::new(entity.to_datum())),
                    })
                    .collect();
                (slot.property.name().to_owned(), RawValues::Many(values))
            })
            .collect();
        EntityDatum {
            id: self.id.clone(),
            schema: Some(self.schema.name().to_owned()),
            properties,
            caption: Some(self.get_caption()),
            datasets: self.datasets.clone(),
            referents: self.referents.clone(),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.schema == other.schema && self.slots == other.slots
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<_> = self
            .slots
            .iter()
            .map(|(qname, slot)| (qname, &slot.values))
            .collect();
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("schema", &self.schema.name())
            .field("values", &values)
            .finish()
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_datum().serialize(serializer)
    }
}
