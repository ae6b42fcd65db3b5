//! CLI command implementations
//!
//! Each command returns the `data` of its response; [`run`] writes the
//! single JSON response object and reports failure to `main`.

use std::path::Path;

use serde_json::{json, Value};

use crate::initializer::SchemaInitializer;
use crate::maintenance::{backup_database, clean_collections};
use crate::model::{self, EntitySchema};
use crate::observability::{init_logging, Event, LogFormat};
use crate::store::FileStore;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments, run the command and print its response.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match run_command(cli.command) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code(), &e.to_string(), e.details())?;
            Err(e)
        }
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Verify { config } => verify(&config),
        Command::Schema { collection } => schema(collection.as_deref()),
        Command::Clean { config } => clean(&config),
        Command::Backup { config } => backup(&config),
    }
}

/// Create every collection, validator and index.
///
/// Safe to repeat: existing collections and identical indexes are kept.
pub fn init(config_path: &Path) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let mut store = FileStore::open(config.data_path(), &config.database)?;

    let report = SchemaInitializer::new(config.init_options()).run(&mut store)?;

    Ok(json!({
        "message": report.confirmation_message(),
        "report": report,
    }))
}

/// Report differences between the database and the data model.
///
/// Fails with `CLI_SCHEMA_DRIFT` when any difference exists.
pub fn verify(config_path: &Path) -> CliResult<Value> {
    let (config, store) = open_existing(config_path)?;

    let report = SchemaInitializer::new(config.init_options()).verify(&store)?;
    if !report.is_clean() {
        return Err(CliError::Drift(report));
    }

    Ok(serde_json::to_value(&report)?)
}

/// Print validators and indexes without touching any database.
pub fn schema(collection: Option<&str>) -> CliResult<Value> {
    init_logging(LogFormat::default());

    let entities: Vec<&EntitySchema> = match collection {
        Some(name) => vec![model::entity(name)
            .ok_or_else(|| CliError::UnknownCollection(name.to_string()))?],
        None => model::entities().iter().collect(),
    };

    let described: Vec<Value> = entities.into_iter().map(describe).collect();
    Ok(json!({ "collections": described }))
}

/// Delete every document of every schema collection.
pub fn clean(config_path: &Path) -> CliResult<Value> {
    let (_config, mut store) = open_existing(config_path)?;

    let names: Vec<&str> = model::entities().iter().map(|e| e.collection).collect();
    let report = clean_collections(&mut store, &names)?;
    if report.has_failures() {
        return Err(CliError::CleanIncomplete(report));
    }

    Ok(serde_json::to_value(&report)?)
}

/// Archive the database directory.
pub fn backup(config_path: &Path) -> CliResult<Value> {
    let (config, store) = open_existing(config_path)?;

    let report = backup_database(&store, &config.backup_path())?;

    Ok(serde_json::to_value(&report)?)
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_logging(config.log_format);

    tracing::info!(
        event = Event::ConfigLoaded.as_str(),
        config = %config_path.display(),
        data_dir = %config.data_path().display(),
        database = %config.database
    );
    Ok(config)
}

/// Opens a database that must already exist; nothing is created on disk.
fn open_existing(config_path: &Path) -> CliResult<(Config, FileStore)> {
    let config = load_config(config_path)?;
    let store = FileStore::open_existing(config.data_path(), &config.database)?;
    Ok((config, store))
}

fn describe(entity: &EntitySchema) -> Value {
    let indexes: Vec<Value> = entity
        .index_models()
        .iter()
        .map(|m| {
            json!({
                "name": m.name(),
                "key": m.key_pattern(),
                "unique": m.options.unique,
                "sparse": m.options.sparse,
            })
        })
        .collect();

    json!({
        "collection": entity.collection,
        "entity": entity.entity,
        "kind": entity.kind,
        "command": model::validator(entity).coll_mod_command(entity.collection),
        "indexes": indexes,
    })
}
