//! Maintenance operations
//!
//! - [`clean_collections`]: empty collections, keeping validators and indexes
//! - [`backup_database`]: archive a directory-backed database
//!
//! # Archive Format
//!
//! ```text
//! costadelinka_backup_<YYYYmmdd_HHMMSS>.tar
//! ├── backup_manifest.json
//! └── <database>/
//!     └── <collection>/
//!         ├── collection.json
//!         └── documents.json
//! ```
//!
//! Backup is read-only and leaves no partial archive behind on failure.

mod archive;
mod clean;
mod errors;
mod manifest;

pub use archive::read_archive_manifest;
pub use clean::{clean_collections, CleanOutcome, CleanReport, CollectionClean};
pub use errors::{MaintenanceError, MaintenanceResult};
pub use manifest::{BackupManifest, BACKUP_MANIFEST_FILE};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::observability::Event;
use crate::store::{DocumentStore, FileStore};

use archive::{cleanup_partial_archive, create_tar_archive};

/// Archive file name prefix.
pub const BACKUP_PREFIX: &str = "costadelinka_backup_";

/// Result of a successful backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    pub backup_id: String,
    pub archive: PathBuf,
    pub created_at: String,
    pub database: String,
    pub collections: Vec<String>,
    pub size_bytes: u64,
}

/// Archive file name for a backup taken at `at`.
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("{}{}.tar", BACKUP_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

/// Archives every collection of `store` into `backup_dir`.
///
/// # Errors
///
/// - `Store` if the store is unreachable
/// - `ArchiveExists` if a backup with the same timestamp exists
/// - `Io` / `Manifest` on write failures; the partial archive is removed
pub fn backup_database(store: &FileStore, backup_dir: &Path) -> MaintenanceResult<BackupReport> {
    store.ping()?;
    let database = store.database_name().to_string();
    let collections = store.list_collections()?;

    fs::create_dir_all(backup_dir).map_err(|e| MaintenanceError::io(backup_dir, e))?;

    let at = Utc::now();
    let archive_path = backup_dir.join(backup_file_name(at));
    let manifest = BackupManifest::new(&database, collections, at);

    tracing::info!(
        event = Event::BackupStart.as_str(),
        database = %database,
        backup_id = %manifest.backup_id,
        archive = %archive_path.display()
    );

    let mtime = u64::try_from(at.timestamp()).unwrap_or(0);
    let size_bytes = match create_tar_archive(store.root(), &database, &manifest, mtime, &archive_path) {
        Ok(size) => size,
        Err(e) => {
            if !matches!(e, MaintenanceError::ArchiveExists(_)) {
                cleanup_partial_archive(&archive_path);
            }
            tracing::error!(
                event = Event::BackupFailed.as_str(),
                database = %database,
                code = e.code(),
                error = %e
            );
            return Err(e);
        }
    };

    tracing::info!(
        event = Event::BackupComplete.as_str(),
        database = %database,
        backup_id = %manifest.backup_id,
        size_bytes
    );

    Ok(BackupReport {
        backup_id: manifest.backup_id,
        archive: archive_path,
        created_at: manifest.created_at,
        database,
        collections: manifest.collections,
        size_bytes,
    })
}
