use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::definition::{EdgeDefinition, SchemaDefinition};
use crate::property::Property;

/// A named entity type with an inheritable property set.
///
/// Schemata are built by the [`Model`](crate::Model) after all of their
/// parents, so the effective property set and the ancestor list are
/// computed once and never change afterwards. Parents are referenced by
/// name and resolved through the owning model.
#[derive(Debug)]
pub struct Schema {
    name: String,
    label: Option<String>,
    plural: Option<String>,
    description: Option<String>,
    extends: Vec<String>,
    is_abstract: bool,
    matchable: bool,
    featured: Vec<String>,
    required: Vec<String>,
    caption: Vec<String>,
    edge: Option<Edge>,
    own: IndexMap<String, Arc<Property>>,
    /// Effective properties keyed by qualified name, ancestors first.
    properties: IndexMap<String, Arc<Property>>,
    /// Effective properties keyed by local name; the nearest declaration wins.
    by_name: IndexMap<String, Arc<Property>>,
    /// This schema followed by all of its ancestors.
    schemata: IndexSet<String>,
}

/// Source and target properties of a relationship schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub caption: Vec<String>,
    pub label: Option<String>,
    pub directed: bool,
}

impl From<&EdgeDefinition> for Edge {
    fn from(definition: &EdgeDefinition) -> Self {
        Self {
            source: definition.source.clone(),
            target: definition.target.clone(),
            caption: definition.caption.clone(),
            label: definition.label.clone(),
            directed: definition.directed,
        }
    }
}

impl Schema {
    /// Links a schema against its already-built parents.
    pub(crate) fn link(
        name: &str,
        definition: &SchemaDefinition,
        own: IndexMap<String, Arc<Property>>,
        parents: &[Arc<Schema>],
    ) -> Self {
        let mut schemata = IndexSet::new();
        schemata.insert(name.to_owned());
        let mut properties = IndexMap::new();
        let mut by_name = IndexMap::new();
        let mut required = IndexSet::new();

        for parent in parents {
            schemata.extend(parent.schemata.iter().cloned());
            for (qname, prop) in &parent.properties {
                properties.insert(qname.clone(), Arc::clone(prop));
            }
            for (local, prop) in &parent.by_name {
                by_name.insert(local.clone(), Arc::clone(prop));
            }
            required.extend(parent.required.iter().cloned());
        }
        for (local, prop) in &own {
            properties.insert(prop.qname().to_owned(), Arc::clone(prop));
            by_name.insert(local.clone(), Arc::clone(prop));
        }
        required.extend(definition.required.iter().cloned());

        let caption = inherit_list(&definition.caption, parents, |p| &p.caption)
            .or_else(|| by_name.contains_key("name").then(|| vec!["name".to_owned()]))
            .unwrap_or_default();
        let featured =
            inherit_list(&definition.featured, parents, |p| &p.featured).unwrap_or_default();

        Self {
            name: name.to_owned(),
            label: definition.label.clone(),
            plural: definition.plural.clone(),
            description: definition.description.clone(),
            extends: definition.extends.clone(),
            is_abstract: definition.is_abstract,
            matchable: definition.matchable,
            featured,
            required: required.into_iter().collect(),
            caption,
            edge: definition.edge.as_ref().map(Edge::from),
            own,
            properties,
            by_name,
            schemata,
        }
    }

    /// Filter predicate for lenient lookups: drops anything that did not
    /// resolve to a schema.
    #[must_use]
    pub fn is_schema(candidate: Option<&Arc<Schema>>) -> bool {
        candidate.is_some()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

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

    /// Names of the direct parents.
    #[must_use]
    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    #[must_use]
    pub fn matchable(&self) -> bool {
        self.matchable
    }

    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    #[must_use]
    pub fn edge(&self) -> Option<&Edge> {
        self.edge.as_ref()
    }

    #[must_use]
    pub fn is_edge(&self) -> bool {
        self.edge.is_some()
    }

    /// Property names consulted in order when computing an entity caption.
    ///
    /// The schema's own list, else the first parent's, else `["name"]` when
    /// the schema has a `name` property.
    #[must_use]
    pub fn caption_properties(&self) -> &[String] {
        &self.caption
    }

    /// This schema and the names of all of its ancestors.
    pub fn schemata(&self) -> impl Iterator<Item = &str> {
        self.schemata.iter().map(String::as_str)
    }

    /// True if `other` is this schema or one of its ancestors.
    #[must_use]
    pub fn is_a(&self, other: &Schema) -> bool {
        self.is_a_name(&other.name)
    }

    #[must_use]
    pub fn is_a_name(&self, name: &str) -> bool {
        self.schemata.contains(name)
    }

    /// The effective property set: own and inherited properties, one per
    /// qualified name, ancestors first.
    #[must_use]
    pub fn get_properties(&self) -> Vec<Arc<Property>> {
        self.properties.values().cloned().collect()
    }

    /// Properties declared by this schema itself.
    pub fn own_properties(&self) -> impl Iterator<Item = &Arc<Property>> {
        self.own.values()
    }

    /// Looks up a property by its local name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Arc<Property>> {
        self.by_name.get(name)
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// True if `property` is part of the effective property set.
    #[must_use]
    pub fn contains(&self, property: &Property) -> bool {
        self.properties.contains_key(property.qname())
    }

    #[must_use]
    pub fn get_featured_properties(&self) -> Vec<Arc<Property>> {
        self.featured
            .iter()
            .filter_map(|name| self.by_name.get(name))
            .cloned()
            .collect()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn inherit_list<'a>(
    own: &[String],
    parents: &'a [Arc<Schema>],
    select: impl Fn(&'a Schema) -> &'a Vec<String>,
) -> Option<Vec<String>> {
    if !own.is_empty() {
        return Some(own.to_vec());
    }
    parents
        .iter()
        .map(|p| select(p))
        .find(|list| !list.is_empty())
        .cloned()
}

/// A schema given either by name or as an already-resolved handle.
#[derive(Debug, Clone, Copy)]
pub enum SchemaRef<'a> {
    Name(&'a str),
    Schema(&'a Arc<Schema>),
    /// No schema given at all, e.g. a record without a `schema` field.
    Missing,
}

impl<'a> From<&'a str> for SchemaRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for SchemaRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Arc<Schema>> for SchemaRef<'a> {
    fn from(schema: &'a Arc<Schema>) -> Self {
        Self::Schema(schema)
    }
}

impl<'a> From<Option<&'a str>> for SchemaRef<'a> {
    fn from(name: Option<&'a str>) -> Self {
        name.map_or(Self::Missing, Self::Name)
    }
}
