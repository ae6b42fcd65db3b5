//! CLI-specific error types
//!
//! All CLI errors are fatal: the command prints one error object and the
//! process exits non-zero.

use serde_json::Value;
use thiserror::Error;

use crate::initializer::{DriftReport, InitError};
use crate::maintenance::{CleanReport, MaintenanceError};
use crate::store::StoreError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file missing, malformed or invalid
    #[error("{0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),

    /// The database differs from the data model
    #[error("schema drift detected: {} difference(s)", .0.drifts.len())]
    Drift(DriftReport),

    /// Some collections could not be emptied
    #[error("clean incomplete")]
    CleanIncomplete(CleanReport),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) => "CLI_IO_ERROR",
            CliError::UnknownCollection(_) => "CLI_UNKNOWN_COLLECTION",
            CliError::Store(e) => e.code(),
            CliError::Init(e) => e.code(),
            CliError::Maintenance(e) => e.code(),
            CliError::Drift(_) => "CLI_SCHEMA_DRIFT",
            CliError::CleanIncomplete(_) => "CLI_CLEAN_INCOMPLETE",
        }
    }

    /// Structured details attached to the error response.
    pub fn details(&self) -> Option<Value> {
        match self {
            CliError::Drift(report) => serde_json::to_value(report).ok(),
            CliError::CleanIncomplete(report) => serde_json::to_value(report).ok(),
            CliError::Init(e) => e
                .store_error()
                .map(|s| serde_json::json!({ "store_code": s.code(), "category": s.category().as_str() })),
            _ => None,
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
