//! Catalog metadata and API result envelopes.
//!
//! The API layer serves three kinds of payloads next to the model
//! definition itself:
//! - [`Catalog`]: a named list of [`Dataset`]s with publisher and coverage metadata
//! - [`EntitiesResult`]: one page of raw entity records plus paging links
//! - [`AggregationResult`]: min/max/sum/avg/count aggregations, flat or grouped
//!
//! These are plain `serde` types. Fetching them is the caller's job; turning
//! records into [`Entity`](entigraph_model::Entity) proxies goes through a
//! [`Model`](entigraph_model::Model).

mod dataset;
mod results;

pub use dataset::{
    Catalog, CountryStats, Coverage, Dataset, DatasetCategory, Frequency, Maintainer, Publisher,
    Resource, SchemaStats, SchemataStats,
};
pub use results::{
    Aggregation, AggregationEntry, AggregationGroup, AggregationResult, AggregationValue,
    EntitiesResult, Grouper,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading catalog payloads.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("entity error: {0}")]
    Model(#[from] entigraph_model::Error),
}
