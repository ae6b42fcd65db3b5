//! Observability subsystem
//!
//! Structured logging through `tracing`:
//! - One log line = one event, named by an [`Event`] in the `event` field
//! - JSON lines by default, human-readable output on request
//! - Logs go to stderr; stdout is reserved for command responses
//! - Level filter from `RUST_LOG`, `info` otherwise
//!
//! # Usage
//!
//! ```ignore
//! use costainka::observability::{init_logging, Event, LogFormat};
//!
//! init_logging(LogFormat::Json);
//! tracing::info!(event = Event::CollectionCreated.as_str(), collection = "Pagos");
//! ```

mod events;

pub use events::Event;

use std::fmt;
use std::io;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default level filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

static INIT: Once = Once::new();

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable lines
    Pretty,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Installs the global subscriber.
///
/// Only the first call has an effect; later calls (and calls after another
/// subscriber was installed, e.g. by a test harness) are ignored.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let registry = tracing_subscriber::registry().with(filter);

        let result = match format {
            LogFormat::Json => registry
                .with(
                    tracing_fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_target(false)
                        .with_current_span(false),
                )
                .try_init(),
            LogFormat::Pretty => registry
                .with(
                    tracing_fmt::layer()
                        .compact()
                        .with_writer(io::stderr)
                        .with_target(false),
                )
                .try_init(),
        };

        if result.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}
