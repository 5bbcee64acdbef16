use std::sync::Arc;

use chrono::Datelike;
use entigraph_catalog::{
    AggregationEntry, AggregationResult, AggregationValue, Catalog, DatasetCategory,
    EntitiesResult, Error, Frequency,
};
use entigraph_model::Model;
use pretty_assertions::assert_eq;
use serde_json::json;

const CATALOG: &str = include_str!("fixtures/catalog.json");
const ENTITIES: &str = include_str!("fixtures/entities.json");
const AGGREGATIONS: &str = include_str!("fixtures/aggregations.json");

fn model() -> Arc<Model> {
    Arc::new(
        Model::from_value(json!({
            "schemata": {
                "Person": {
                    "properties": {
                        "name": {"type": "name"},
                        "birthDate": {"type": "date"}
                    }
                }
            },
            "types": {"name": {}, "date": {}}
        }))
        .unwrap(),
    )
}

// ── Catalog ──────────────────────────────────────────────────────

#[test]
fn catalog_parses() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    assert_eq!(catalog.name, "investigations");
    assert_eq!(catalog.datasets().len(), 2);
    assert_eq!(
        catalog.dataset_names().collect::<Vec<_>>(),
        vec!["eu_authorities", "ec_meetings"]
    );
    assert_eq!(catalog.entity_count(), 151 + 45038);
    assert_eq!(catalog.publisher.as_ref().unwrap().official, Some(false));
}

#[test]
fn catalog_without_datasets() {
    let catalog: Catalog =
        serde_json::from_value(json!({"name": "empty", "datasets": null})).unwrap();
    assert!(catalog.datasets().is_empty());
    assert!(catalog.get_dataset("anything").is_none());
}

#[test]
fn malformed_catalog_fails() {
    let err = Catalog::from_json("{\"title\": \"no name\"}").unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

// ── Dataset ──────────────────────────────────────────────────────

#[test]
fn dataset_metadata() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let ds = catalog.get_dataset("eu_authorities").unwrap();
    assert_eq!(ds.label(), "European Union Authorities");
    assert_eq!(ds.category, Some(DatasetCategory::Regulatory));
    assert_eq!(ds.updated().unwrap().day(), 2);

    let coverage = ds.coverage.as_ref().unwrap();
    assert_eq!(coverage.frequency, Some(Frequency::Weekly));
    // A bare year is a partial date and does not parse as a timestamp.
    assert!(coverage.start_date().is_none());
    assert_eq!(coverage.end_date().unwrap().month(), 11);

    let resource = ds.resource("entities.ftm.json").unwrap();
    assert_eq!(resource.size, Some(204_800));
}

#[test]
fn dataset_label_falls_back_to_name() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let ds = catalog.get_dataset("ec_meetings").unwrap();
    assert_eq!(ds.label(), "ec_meetings");
    assert_eq!(ds.category, None);
    assert_eq!(ds.maintainer.as_ref().unwrap().country.as_deref(), Some("de"));
}

#[test]
fn schema_counts_span_things_and_intervals() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let ds = catalog.get_dataset("ec_meetings").unwrap();
    assert_eq!(ds.schema_count("Person"), 794);
    assert_eq!(ds.schema_count("Event"), 34975);
    assert_eq!(ds.schema_count("Company"), 0);
}

#[test]
fn country_counts() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let things = catalog
        .get_dataset("eu_authorities")
        .unwrap()
        .things
        .as_ref()
        .unwrap();
    assert_eq!(things.count_for_country("eu"), 151);
    assert_eq!(things.count_for_country("de"), 0);
}

#[test]
fn category_serializes_lowercase() {
    assert_eq!(
        serde_json::to_value(DatasetCategory::Casefile).unwrap(),
        json!("casefile")
    );
    assert_eq!(
        serde_json::from_value::<Frequency>(json!("annually")).unwrap(),
        Frequency::Annually
    );
}

// ── Entity pages ─────────────────────────────────────────────────

#[test]
fn entities_page_parses() {
    let page = EntitiesResult::from_json(ENTITIES).unwrap();
    assert_eq!(page.total, 2);
    assert!(!page.has_next());
    assert!(!page.has_prev());
    assert_eq!(page.query["schema"], json!("Person"));
    assert_eq!(page.coverage.countries.as_ref().unwrap().len(), 2);
}

#[test]
fn entities_page_wraps_records() {
    let m = model();
    let page = EntitiesResult::from_json(ENTITIES).unwrap();
    let entities = page.into_entities(&m).unwrap();
    let captions: Vec<String> = entities.iter().map(|e| e.get_caption()).collect();
    assert_eq!(captions, vec!["Jane Doe", "John Roe"]);
    assert_eq!(entities[1].referents(), ["old-p2"]);
    assert_eq!(entities[0].datasets(), ["ec_meetings"]);
}

#[test]
fn entities_page_fails_on_unknown_schema() {
    let m = model();
    let mut page = EntitiesResult::from_json(ENTITIES).unwrap();
    page.entities[1].schema = Some("Vessel".into());
    let err = page.into_entities(&m).unwrap_err();
    assert!(matches!(err, Error::Model(_)));
}

// ── Aggregations ─────────────────────────────────────────────────

#[test]
fn flat_aggregations() {
    let result = AggregationResult::from_json(AGGREGATIONS).unwrap();
    let date = result.flat("date").unwrap();
    assert_eq!(date.min, Some(AggregationValue::Text("2014-11-12".into())));
    assert_eq!(date.count, Some(12.0));
    let amount = result.flat("amount").unwrap();
    assert_eq!(amount.sum, Some(1500.5));
    assert!(result.grouped("date").is_none());
}

#[test]
fn grouped_aggregations() {
    let result = AggregationResult::from_json(AGGREGATIONS).unwrap();
    let groups = result.grouped("groups").unwrap();
    let by_country = &groups.count.as_ref().unwrap()["country"];
    assert_eq!(by_country["fr"], AggregationValue::Number(7.0));
    assert!(matches!(
        result.aggregations["groups"],
        AggregationEntry::Grouped(_)
    ));
    assert!(result.flat("groups").is_none());
}
