//! Initializer error types
//!
//! Fatal failures keep the original `StoreError` as their source; the
//! initializer never retries and never rewrites the store's error.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Store command issued by the initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Ping,
    CreateCollection,
    SetValidator,
    CreateIndex,
    Inspect,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Ping => "ping",
            Step::CreateCollection => "create_collection",
            Step::SetValidator => "set_validator",
            Step::CreateIndex => "create_index",
            Step::Inspect => "inspect",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal initializer error
#[derive(Debug, Error)]
pub enum InitError {
    /// The store did not answer the initial ping; no step was attempted.
    #[error("cannot reach the document store: {source}")]
    Connection {
        #[source]
        source: StoreError,
    },

    /// A store command failed with something other than "already exists".
    #[error("{step} failed on '{collection}': {source}")]
    Step {
        collection: String,
        step: Step,
        #[source]
        source: StoreError,
    },

    /// The overall deadline passed before the next command.
    #[error("initialization exceeded its {}s deadline before {step} on '{collection}'", .timeout.as_secs_f64())]
    Timeout {
        timeout: Duration,
        collection: String,
        step: Step,
    },
}

impl InitError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            InitError::Connection { .. } => "INIT_CONNECTION_FAILED",
            InitError::Step { .. } => "INIT_STEP_FAILED",
            InitError::Timeout { .. } => "INIT_TIMEOUT",
        }
    }

    /// The raw store error, when the store reported one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            InitError::Connection { source } | InitError::Step { source, .. } => Some(source),
            InitError::Timeout { .. } => None,
        }
    }
}

/// Result type for initializer operations
pub type InitResult<T> = Result<T, InitError>;
