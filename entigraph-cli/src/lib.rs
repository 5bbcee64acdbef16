//! Arguments, dispatch and formatting behind the `entigraph` binary.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use entigraph_catalog::{Catalog, EntitiesResult};
use entigraph_model::{Entity, EntityDatum, Model};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "entigraph")]
#[command(about = "Inspect entity graph models and entity files")]
pub struct Args {
    /// Path to the model definition JSON
    #[arg(short, long, env = "ENTIGRAPH_MODEL", default_value = "model.json")]
    pub model: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List schemata with their parents and property counts
    Schemata,
    /// List properties by qualified name
    Properties {
        /// Only the effective properties of this schema
        #[arg(short, long)]
        schema: Option<String>,
    },
    /// Print id, schema and caption of every entity in a file
    Captions {
        /// JSON array, result page or newline-delimited records
        entities: PathBuf,
    },
    /// Print the display values of one entity
    Show {
        entities: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// List the datasets of a catalog
    Datasets { catalog: PathBuf },
}

/// Runs one command and returns its output lines.
pub fn run(args: &Args) -> Result<Vec<String>> {
    debug!("command: {:?}", args.command);
    if let Command::Datasets { catalog } = &args.command {
        return Ok(dataset_lines(&load_catalog(catalog)?));
    }

    let model = load_model(&args.model)?;
    info!(
        "Loaded model {} ({} schemata)",
        args.model.display(),
        model.get_schemata().len()
    );
    let lines = match &args.command {
        Command::Schemata => schema_lines(&model),
        Command::Properties { schema } => property_lines(&model, schema.as_deref())?,
        Command::Captions { entities } => caption_lines(&load_entities(&model, entities)?),
        Command::Show { entities, id } => show_lines(&load_entities(&model, entities)?, id)?,
        Command::Datasets { .. } => Vec::new(),
    };
    Ok(lines)
}

/// Reads and links a model definition document.
pub fn load_model(path: &Path) -> Result<Arc<Model>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model definition {}", path.display()))?;
    let model = Model::from_json(&json)
        .with_context(|| format!("Invalid model definition {}", path.display()))?;
    Ok(Arc::new(model))
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    Catalog::from_json(&json).with_context(|| format!("Invalid catalog {}", path.display()))
}

/// Parses entity records from a JSON array, an entities result page, or
/// newline-delimited JSON.
pub fn parse_records(input: &str) -> Result<Vec<EntityDatum>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid entity array");
    }
    if let Ok(page) = serde_json::from_str::<EntitiesResult>(trimmed) {
        debug!(url = %page.url, total = page.total, "reading result page");
        return Ok(page.entities);
    }
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid entity record on line {}", index + 1))
        })
        .collect()
}

/// Reads an entity file and wraps every record through the model.
pub fn load_entities(model: &Arc<Model>, path: &Path) -> Result<Vec<Arc<Entity>>> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("Failed to read entities {}", path.display()))?;
    let records = parse_records(&input)?;
    debug!(records = records.len(), "parsed entity records");
    records
        .into_iter()
        .map(|datum| {
            let id = datum.id.clone();
            model
                .get_entity(datum)
                .with_context(|| format!("Entity {id} does not fit the model"))
        })
        .collect()
}

/// One line per schema: name, label, parents, effective property count.
pub fn schema_lines(model: &Model) -> Vec<String> {
    model
        .get_schemata()
        .iter()
        .map(|schema| {
            let parents = if schema.extends().is_empty() {
                "-".to_owned()
            } else {
                schema.extends().join(",")
            };
            format!(
                "{}\t{}\t{}\t{}",
                schema.name(),
                schema.label(),
                parents,
                schema.get_properties().len()
            )
        })
        .collect()
}

/// One line per property: qualified name and type. With a schema, lists
/// its effective properties, inherited ones included.
pub fn property_lines(model: &Model, schema: Option<&str>) -> Result<Vec<String>> {
    let properties = match schema {
        Some(name) => model.get_schema(name)?.get_properties(),
        None => model.get_properties(),
    };
    Ok(properties
        .iter()
        .map(|prop| format!("{}\t{}", prop.qname(), prop.property_type().name()))
        .collect())
}

pub fn caption_lines(entities: &[Arc<Entity>]) -> Vec<String> {
    entities
        .iter()
        .map(|entity| {
            format!(
                "{}\t{}\t{}",
                entity.id(),
                entity.schema().name(),
                entity.get_caption()
            )
        })
        .collect()
}

/// Caption header followed by `label: value; value` for each held property.
pub fn show_lines(entities: &[Arc<Entity>], id: &str) -> Result<Vec<String>> {
    let Some(entity) = entities.iter().find(|e| e.id() == id) else {
        bail!("No entity with id {id}");
    };
    let mut lines = vec![format!(
        "{} [{}]",
        entity.get_caption(),
        entity.schema().label()
    )];
    for prop in entity.get_properties() {
        let values: Vec<String> = entity
            .get_display_values(&prop)?
            .iter()
            .map(ToString::to_string)
            .collect();
        lines.push(format!("{}: {}", prop.label(), values.join("; ")));
    }
    Ok(lines)
}

pub fn dataset_lines(catalog: &Catalog) -> Vec<String> {
    catalog
        .datasets()
        .iter()
        .map(|ds| {
            let count = ds
                .entity_count
                .map_or_else(|| "-".to_owned(), |count| count.to_string());
            format!("{}\t{}\t{}", ds.name, ds.label(), count)
        })
        .collect()
}
