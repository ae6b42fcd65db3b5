//! Backup manifest
//!
//! Recorded inside every archive as `backup_manifest.json`:
//! - backup_id: random UUID
//! - created_at: RFC3339 timestamp (UTC, seconds)
//! - database: name of the archived database
//! - collections: archived collection names, sorted
//! - format_version: always 1

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{MaintenanceError, MaintenanceResult};

/// Location of the manifest inside the archive.
pub const BACKUP_MANIFEST_FILE: &str = "backup_manifest.json";

const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupManifest {
    pub backup_id: String,
    pub created_at: String,
    pub database: String,
    pub collections: Vec<String>,
    pub format_version: u8,
}

impl BackupManifest {
    /// Creates a manifest stamped with `at`.
    pub fn new(database: &str, collections: Vec<String>, at: DateTime<Utc>) -> Self {
        Self {
            backup_id: Uuid::new_v4().to_string(),
            created_at: at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            database: database.to_string(),
            collections,
            format_version: FORMAT_VERSION,
        }
    }

    pub fn to_json(&self) -> MaintenanceResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MaintenanceError::Manifest(format!("serialize: {}", e)))
    }

    pub fn from_json(json: &str) -> MaintenanceResult<Self> {
        let manifest: Self = serde_json::from_str(json)
            .map_err(|e| MaintenanceError::Manifest(format!("parse: {}", e)))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(MaintenanceError::Manifest(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }
}
