use std::collections::HashSet;
use std::sync::Arc;

use entigraph_model::{
    DefinitionError, EntityDatum, Error, Model, ModelDefinition, PropertyDefinition,
    SchemaDefinition, SchemaRef, TypeDefinition,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const FIXTURE: &str = include_str!("fixtures/model.json");

fn model() -> Model {
    Model::from_json(FIXTURE).unwrap()
}

fn names(schemata: &[Arc<entigraph_model::Schema>]) -> Vec<&str> {
    schemata.iter().map(|s| s.name()).collect()
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn builds_from_fixture() {
    let m = model();
    assert_eq!(m.get_schemata().len(), 8);
    assert_eq!(m.get_types().len(), 8);
}

#[test]
fn schemata_keep_document_order() {
    let m = model();
    assert_eq!(
        names(&m.get_schemata()),
        vec![
            "Person",
            "Thing",
            "LegalEntity",
            "Asset",
            "Organization",
            "Company",
            "Interval",
            "Ownership"
        ]
    );
}

#[test]
fn forward_references_resolve() {
    // Person is declared before LegalEntity and Thing.
    let m = model();
    let person = m.get_schema("Person").unwrap();
    assert!(person.has_property("name"));
    assert!(person.is_a_name("Thing"));
}

#[test]
fn from_value_matches_from_json() {
    let value: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
    let m = Model::from_value(value).unwrap();
    assert_eq!(m.get_properties().len(), model().get_properties().len());
}

#[test]
fn construct_from_typed_definition() {
    let mut definition = ModelDefinition::default();
    definition.types.insert("string".into(), TypeDefinition::default());
    let mut person = SchemaDefinition::default();
    person
        .properties
        .insert("name".into(), PropertyDefinition::of_type("string"));
    definition.schemata.insert("Person".into(), person);

    let m = Model::new(&definition).unwrap();
    assert!(m.get_property("Person:name").is_some());
}

#[test]
fn property_type_defaults_to_string() {
    let m = Model::from_value(json!({
        "schemata": {"Note": {"properties": {"title": {}}}},
        "types": {"string": {}}
    }))
    .unwrap();
    let prop = m.get_property("Note:title").unwrap();
    assert_eq!(prop.property_type().name(), "string");
}

// ── Construction errors ──────────────────────────────────────────

#[test]
fn unknown_parent_fails() {
    let err = Model::from_value(json!({
        "schemata": {"Person": {"extends": ["Ghost"]}},
        "types": {}
    }))
    .unwrap_err();
    match err {
        Error::ModelDefinition(DefinitionError::UnknownParent { schema, parent }) => {
            assert_eq!(schema, "Person");
            assert_eq!(parent, "Ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_type_fails() {
    let err = Model::from_value(json!({
        "schemata": {"Person": {"properties": {"age": {"type": "integer"}}}},
        "types": {"string": {}}
    }))
    .unwrap_err();
    match err {
        Error::ModelDefinition(DefinitionError::UnknownType {
            property,
            type_name,
        }) => {
            assert_eq!(property, "Person:age");
            assert_eq!(type_name, "integer");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_range_fails() {
    let err = Model::from_value(json!({
        "schemata": {"Link": {"properties": {"to": {"type": "entity", "range": "Nowhere"}}}},
        "types": {"entity": {}}
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        Error::ModelDefinition(DefinitionError::UnknownRange { .. })
    ));
}

#[test]
fn inheritance_cycle_fails() {
    let err = Model::from_value(json!({
        "schemata": {
            "A": {"extends": ["B"]},
            "B": {"extends": ["C"]},
            "C": {"extends": ["A"]}
        },
        "types": {}
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        Error::ModelDefinition(DefinitionError::CyclicInheritance { .. })
    ));
}

#[test]
fn self_extension_fails() {
    let err = Model::from_value(json!({
        "schemata": {"A": {"extends": ["A"]}},
        "types": {}
    }))
    .unwrap_err();
    match err {
        Error::ModelDefinition(DefinitionError::CyclicInheritance { schema }) => {
            assert_eq!(schema, "A");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_definition_fails() {
    let err = Model::from_json("{\"schemata\": []}").unwrap_err();
    assert!(matches!(
        err,
        Error::ModelDefinition(DefinitionError::Malformed(_))
    ));
}

#[test]
fn definition_error_messages() {
    let err = DefinitionError::UnknownParent {
        schema: "Person".into(),
        parent: "Ghost".into(),
    };
    assert_eq!(err.to_string(), "schema Person extends undeclared schema Ghost");
}

// ── Schema lookup ────────────────────────────────────────────────

#[test]
fn get_schema_by_name() {
    let m = model();
    let schema = m.get_schema("Company").unwrap();
    assert_eq!(schema.name(), "Company");
    assert_eq!(schema.label(), "Company");
}

#[test]
fn get_schema_with_handle_returns_same_instance() {
    let m = model();
    let schema = m.get_schema("Person").unwrap();
    let again = m.get_schema(&schema).unwrap();
    assert!(Arc::ptr_eq(&schema, &again));
}

#[test]
fn get_schema_without_name_fails() {
    let m = model();
    let err = m.get_schema(None::<&str>).unwrap_err();
    assert!(matches!(err, Error::UnknownSchema { name: None }));
    assert!(matches!(
        m.get_schema(SchemaRef::Missing),
        Err(Error::UnknownSchema { .. })
    ));
}

#[test]
fn get_schema_unknown_name_fails() {
    let m = model();
    let err = m.get_schema("Vessel").unwrap_err();
    assert_eq!(err.to_string(), "no such schema: Vessel");
}

// ── Type lookup ──────────────────────────────────────────────────

#[test]
fn get_type_by_name() {
    let m = model();
    let date = m.get_type("date").unwrap();
    assert_eq!(date.name(), "date");
    assert_eq!(date.plural(), "Dates");
    assert_eq!(date.group(), Some("dates"));
}

#[test]
fn get_type_unknown_is_none() {
    let m = model();
    assert!(m.get_type("nonexistent").is_none());
}

#[test]
fn get_type_with_handle_returns_same_instance() {
    let m = model();
    let name = m.get_type("name").unwrap();
    let again = m.get_type(&name).unwrap();
    assert!(Arc::ptr_eq(&name, &again));
    assert_eq!(name.max_length(), Some(384));
    assert!(name.pivot());
}

// ── Model properties ─────────────────────────────────────────────

#[test]
fn model_properties_are_unique_by_qname() {
    let m = model();
    let props = m.get_properties();
    let qnames: HashSet<&str> = props.iter().map(|p| p.qname()).collect();
    assert_eq!(qnames.len(), props.len());
}

#[test]
fn inherited_property_listed_once() {
    let m = model();
    let count = m
        .get_properties()
        .iter()
        .filter(|p| p.qname() == "Thing:name")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn model_properties_cover_every_declaration() {
    let m = model();
    // 4 Person + 4 Thing + 3 LegalEntity + 1 Asset + 1 Organization
    // + 2 Company + 2 Interval + 3 Ownership
    assert_eq!(m.get_properties().len(), 20);
}

#[test]
fn get_property_by_qname() {
    let m = model();
    let prop = m.get_property("Ownership:owner").unwrap();
    assert_eq!(prop.name(), "owner");
    assert_eq!(prop.schema_name(), "Ownership");
    assert_eq!(prop.range(), Some("LegalEntity"));
    assert_eq!(prop.reverse(), Some("ownershipOwner"));
    assert!(m.get_property("Ownership:nope").is_none());
}

#[test]
fn model_properties_aggregate_listed_schemata() {
    let m = Model::from_value(json!({
        "schemata": {
            "": {"properties": {"name": {}}},
            "Person": {"properties": {"name": {}}}
        },
        "types": {"string": {}}
    }))
    .unwrap();
    assert!(m.get_schema("").is_ok());
    let listed = m.get_schemata();
    assert_eq!(names(&listed), vec!["", "Person"]);
    for prop in m.get_properties() {
        assert!(listed.iter().any(|s| s.name() == prop.schema_name()));
    }
    let qnames: Vec<String> = m
        .get_properties()
        .iter()
        .map(|p| p.qname().to_owned())
        .collect();
    assert_eq!(qnames, vec![":name", "Person:name"]);
}

// ── Hierarchy ────────────────────────────────────────────────────

#[test]
fn parents_in_declaration_order() {
    let m = model();
    let parents = m.get_parents("Company").unwrap();
    assert_eq!(names(&parents), vec!["Organization", "Asset"]);
}

#[test]
fn descendants_are_transitive() {
    let m = model();
    let descendants = m.get_descendants("LegalEntity").unwrap();
    assert_eq!(names(&descendants), vec!["Person", "Organization", "Company"]);
    assert!(m.get_descendants("Company").unwrap().is_empty());
}

#[test]
fn hierarchy_lookups_fail_on_unknown_schema() {
    let m = model();
    assert!(m.get_parents("Ghost").is_err());
    assert!(m.get_descendants("Ghost").is_err());
}

// ── Entity wrapping ──────────────────────────────────────────────

#[test]
fn get_entity_is_identity_preserving() {
    let m = Arc::new(model());
    let raw = EntityDatum::new("p1", "Person").with("name", "Jane Doe");
    let entity = m.get_entity(raw).unwrap();
    let again = m.get_entity(&entity).unwrap();
    assert!(Arc::ptr_eq(&entity, &again));
    let third = m.get_entity(Arc::clone(&again)).unwrap();
    assert!(Arc::ptr_eq(&entity, &third));
}

#[test]
fn get_entity_wraps_fresh_instance_per_record() {
    let m = Arc::new(model());
    let raw = EntityDatum::new("p1", "Person");
    let a = m.get_entity(raw.clone()).unwrap();
    let b = m.get_entity(raw).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a, b);
}

// ── Sharing ──────────────────────────────────────────────────────

#[test]
fn model_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Model>();
    assert_send_sync::<entigraph_model::Entity>();
}

#[test]
fn model_shared_across_threads() {
    let m = Arc::new(model());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let m = Arc::clone(&m);
            std::thread::spawn(move || {
                let raw = EntityDatum::new(format!("p{i}"), "Person").with("name", "Jane");
                m.get_entity(raw).unwrap().get_caption()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "Jane");
    }
}
