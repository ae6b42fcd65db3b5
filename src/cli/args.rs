//! CLI argument definitions using clap
//!
//! Commands:
//! - costainka init --config <path>
//! - costainka verify --config <path>
//! - costainka schema [--collection <name>]
//! - costainka clean --config <path>
//! - costainka backup --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CostaDelInka database schema tool
#[derive(Parser, Debug)]
#[command(name = "costainka")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create collections, validators and indexes
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./costainka.json")]
        config: PathBuf,
    },

    /// Compare the database against the data model
    Verify {
        /// Path to configuration file
        #[arg(long, default_value = "./costainka.json")]
        config: PathBuf,
    },

    /// Print validators and index definitions
    Schema {
        /// Only print this collection
        #[arg(long)]
        collection: Option<String>,
    },

    /// Delete every document, keeping validators and indexes
    Clean {
        /// Path to configuration file
        #[arg(long, default_value = "./costainka.json")]
        config: PathBuf,
    },

    /// Archive the database directory
    Backup {
        /// Path to configuration file
        #[arg(long, default_value = "./costainka.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
