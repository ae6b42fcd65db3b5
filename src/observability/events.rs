//! Observable events
//!
//! Every log line carries an `event` field with one of these names.
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Initialization
    /// Initializer run begins
    InitStart,
    /// Every entity applied
    InitComplete,
    /// Initializer aborted
    InitFailed,
    /// Collection created
    CollectionCreated,
    /// Collection already present, tolerated
    CollectionExists,
    /// Validator installed with collMod
    ValidatorApplied,
    /// Index created
    IndexCreated,
    /// Identical index already present, tolerated
    IndexExists,

    // Verification
    /// Verification begins
    VerifyStart,
    /// Verification complete
    VerifyComplete,
    /// Live schema differs from the data model
    DriftDetected,

    // Maintenance
    /// Collection emptied
    CollectionCleared,
    /// Collection to clean does not exist
    CollectionMissing,
    /// Collection could not be emptied
    CleanFailed,
    /// Backup started
    BackupStart,
    /// Backup complete
    BackupComplete,
    /// Backup failed
    BackupFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::InitStart => "INIT_BEGIN",
            Event::InitComplete => "INIT_COMPLETE",
            Event::InitFailed => "INIT_FAILED",
            Event::CollectionCreated => "COLLECTION_CREATED",
            Event::CollectionExists => "COLLECTION_EXISTS",
            Event::ValidatorApplied => "VALIDATOR_APPLIED",
            Event::IndexCreated => "INDEX_CREATED",
            Event::IndexExists => "INDEX_EXISTS",

            Event::VerifyStart => "VERIFY_BEGIN",
            Event::VerifyComplete => "VERIFY_COMPLETE",
            Event::DriftDetected => "SCHEMA_DRIFT_DETECTED",

            Event::CollectionCleared => "COLLECTION_CLEARED",
            Event::CollectionMissing => "COLLECTION_MISSING",
            Event::CleanFailed => "CLEAN_FAILED",
            Event::BackupStart => "BACKUP_BEGIN",
            Event::BackupComplete => "BACKUP_COMPLETE",
            Event::BackupFailed => "BACKUP_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::InitStart,
            Event::InitComplete,
            Event::InitFailed,
            Event::CollectionCreated,
            Event::CollectionExists,
            Event::ValidatorApplied,
            Event::IndexCreated,
            Event::IndexExists,
            Event::VerifyStart,
            Event::VerifyComplete,
            Event::DriftDetected,
            Event::CollectionCleared,
            Event::CollectionMissing,
            Event::CleanFailed,
            Event::BackupStart,
            Event::BackupComplete,
            Event::BackupFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Event::ValidatorApplied), "VALIDATOR_APPLIED");
    }
}
