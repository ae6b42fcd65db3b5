//! CLI module
//!
//! Provides command-line interface for:
//! - init: Create collections, validators and indexes
//! - verify: Report drift between the database and the data model
//! - schema: Print validators and indexes
//! - clean: Empty every schema collection
//! - backup: Archive the database directory

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{backup, clean, init, run, run_command, schema, verify};
pub use config::{Config, DEFAULT_DATABASE};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};
