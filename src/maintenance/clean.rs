//! Emptying collections
//!
//! Deletes every document of the listed collections while keeping their
//! validators and indexes. Each collection is handled on its own: a missing
//! collection is reported and skipped, a failing one is reported and the
//! remaining ones are still cleaned.

use serde::Serialize;

use super::errors::MaintenanceResult;
use crate::observability::Event;
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanOutcome {
    Cleared { deleted: u64 },
    Missing,
    Failed { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionClean {
    pub collection: String,
    #[serde(flatten)]
    pub outcome: CleanOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub database: String,
    pub collections: Vec<CollectionClean>,
    pub total_deleted: u64,
}

impl CleanReport {
    /// True when at least one collection could not be cleaned.
    pub fn has_failures(&self) -> bool {
        self.collections
            .iter()
            .any(|c| matches!(c.outcome, CleanOutcome::Failed { .. }))
    }
}

/// Deletes all documents of `collections`.
///
/// Only the ping and the collection listing can fail the whole call; per-collection
/// failures end up in the report.
pub fn clean_collections<S: DocumentStore + ?Sized>(
    store: &mut S,
    collections: &[&str],
) -> MaintenanceResult<CleanReport> {
    store.ping()?;
    let existing = store.list_collections()?;

    let mut report = CleanReport {
        database: store.database_name().to_string(),
        collections: Vec::with_capacity(collections.len()),
        total_deleted: 0,
    };

    for &name in collections {
        let outcome = if !existing.iter().any(|c| c == name) {
            tracing::warn!(event = Event::CollectionMissing.as_str(), collection = name);
            CleanOutcome::Missing
        } else {
            match store.delete_all(name) {
                Ok(deleted) => {
                    tracing::info!(
                        event = Event::CollectionCleared.as_str(),
                        collection = name,
                        deleted
                    );
                    report.total_deleted += deleted;
                    CleanOutcome::Cleared { deleted }
                }
                Err(e) => {
                    tracing::error!(
                        event = Event::CleanFailed.as_str(),
                        collection = name,
                        code = e.code(),
                        error = %e
                    );
                    CleanOutcome::Failed {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    }
                }
            }
        };

        report.collections.push(CollectionClean {
            collection: name.to_string(),
            outcome,
        });
    }

    Ok(report)
}
