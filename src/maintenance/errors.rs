//! Maintenance error types
//!
//! Maintenance failures never touch the database itself: a failed backup
//! leaves no partial archive behind, a failed clean leaves the remaining
//! collections untouched.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Maintenance error
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("document store error: {0}")]
    Store(#[from] StoreError),

    #[error("backup archive already exists: {}", .0.display())]
    ArchiveExists(PathBuf),

    #[error("backup I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup manifest error: {0}")]
    Manifest(String),
}

impl MaintenanceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MaintenanceError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            MaintenanceError::Store(e) => e.code(),
            MaintenanceError::ArchiveExists(_) => "BACKUP_ARCHIVE_EXISTS",
            MaintenanceError::Io { .. } => "BACKUP_IO_ERROR",
            MaintenanceError::Manifest(_) => "BACKUP_MANIFEST_ERROR",
        }
    }
}

/// Result type for maintenance operations
pub type MaintenanceResult<T> = Result<T, MaintenanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_code_passes_through() {
        let err: MaintenanceError = StoreError::Unavailable("gone".into()).into();
        assert_eq!(err.code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_io_display() {
        let err = MaintenanceError::io(
            "/backups/x.tar",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code(), "BACKUP_IO_ERROR");
        assert!(err.to_string().contains("/backups/x.tar"));
    }
}
