use std::sync::Arc;

use entigraph_model::{Entity, EntityDatum, Model};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::Coverage;
use crate::Result;

/// One page of entity records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitiesResult {
    pub total: u64,
    pub items: u64,
    /// The query parameters the page was produced for.
    #[serde(default)]
    pub query: IndexMap<String, serde_json::Value>,
    pub url: String,
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default)]
    pub prev_url: Option<String>,
    #[serde(default)]
    pub coverage: Coverage,
    #[serde(default)]
    pub entities: Vec<EntityDatum>,
}

impl EntitiesResult {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_url.is_some()
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.prev_url.is_some()
    }

    /// Wraps every record of the page. Fails on the first record that does
    /// not fit the model.
    pub fn into_entities(self, model: &Arc<Model>) -> Result<Vec<Arc<Entity>>> {
        debug!(url = %self.url, items = self.entities.len(), "wrapping result page");
        self.entities
            .into_iter()
            .map(|datum| model.get_entity(datum).map_err(Into::into))
            .collect()
    }
}

/// An aggregated value; min/max of string properties are strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregationValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<AggregationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<AggregationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
}

/// Aggregations split by a grouping property: function -> property -> group -> value.
pub type Grouper = IndexMap<String, IndexMap<String, AggregationValue>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Grouper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Grouper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<Grouper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<Grouper>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<Grouper>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregationEntry {
    Flat(Aggregation),
    Grouped(AggregationGroup),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub total: u64,
    #[serde(default)]
    pub query: IndexMap<String, serde_json::Value>,
    pub url: String,
    #[serde(default)]
    pub coverage: Coverage,
    #[serde(default)]
    pub aggregations: IndexMap<String, AggregationEntry>,
}

impl AggregationResult {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The ungrouped aggregation of a property, if present.
    #[must_use]
    pub fn flat(&self, property: &str) -> Option<&Aggregation> {
        match self.aggregations.get(property)? {
            AggregationEntry::Flat(aggregation) => Some(aggregation),
            AggregationEntry::Grouped(_) => None,
        }
    }

    #[must_use]
    pub fn grouped(&self, key: &str) -> Option<&AggregationGroup> {
        match self.aggregations.get(key)? {
            AggregationEntry::Grouped(group) => Some(group),
            AggregationEntry::Flat(_) => None,
        }
    }
}
