//! Entigraph command line
//!
//! Inspects a model definition and entity files against it:
//! 1. List schemata and properties of the model
//! 2. Print captions or full display values of entity records
//!
//! Usage:
//!   entigraph --model model.json captions entities.ndjson

use anyhow::Result;
use clap::Parser;
use entigraph_cli::{run, Args};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).init(),
        Err(_) => builder.with_max_level(log_level).init(),
    }

    for line in run(&args)? {
        println!("{line}");
    }
    Ok(())
}
