//! Store error types
//!
//! Every error belongs to one category of the store's taxonomy:
//! - ALREADY_EXISTS: collection or identical index already present
//! - CONFLICTING_DEFINITION: index or validator clashes with what is there
//! - CONNECTION_FAILURE: the store cannot be reached
//! - VALIDATION_REJECTED: a document write violated a validator or unique index
//! - STORAGE: I/O, corruption and addressing errors

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    AlreadyExists,
    ConflictingDefinition,
    ConnectionFailure,
    ValidationRejected,
    Storage,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::AlreadyExists => "ALREADY_EXISTS",
            ErrorCategory::ConflictingDefinition => "CONFLICTING_DEFINITION",
            ErrorCategory::ConnectionFailure => "CONNECTION_FAILURE",
            ErrorCategory::ValidationRejected => "VALIDATION_REJECTED",
            ErrorCategory::Storage => "STORAGE",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "historial_ids_reservas[2]")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn below_minimum(field: impl Into<String>, minimum: f64, actual: impl Into<String>) -> Self {
        Self::new(field, format!("value >= {}", minimum), actual)
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Document store error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{0}' already exists")]
    CollectionExists(String),

    #[error("index '{index}' already exists on '{collection}'")]
    IndexExists { collection: String, index: String },

    #[error("index '{index}' on '{collection}' conflicts with an existing index: {reason}")]
    IndexConflict {
        collection: String,
        index: String,
        reason: String,
    },

    #[error("invalid validator for '{collection}': {reason}")]
    InvalidValidator { collection: String, reason: String },

    #[error("invalid collection name '{0}'")]
    InvalidCollectionName(String),

    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document failed validation in '{collection}': {details}")]
    ValidationFailed {
        collection: String,
        details: ValidationDetails,
    },

    #[error("duplicate key in '{collection}' index '{index}': {key}")]
    DuplicateKey {
        collection: String,
        index: String,
        key: String,
    },

    #[error("invalid document for '{collection}': {reason}")]
    InvalidDocument { collection: String, reason: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupted collection data at {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupted(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StoreError::Corrupted {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::CollectionExists(_) => "STORE_COLLECTION_EXISTS",
            StoreError::IndexExists { .. } => "STORE_INDEX_EXISTS",
            StoreError::IndexConflict { .. } => "STORE_INDEX_CONFLICT",
            StoreError::InvalidValidator { .. } => "STORE_INVALID_VALIDATOR",
            StoreError::InvalidCollectionName(_) => "STORE_INVALID_COLLECTION_NAME",
            StoreError::CollectionNotFound(_) => "STORE_COLLECTION_NOT_FOUND",
            StoreError::Unavailable(_) => "STORE_UNAVAILABLE",
            StoreError::ValidationFailed { .. } => "STORE_VALIDATION_FAILED",
            StoreError::DuplicateKey { .. } => "STORE_DUPLICATE_KEY",
            StoreError::InvalidDocument { .. } => "STORE_INVALID_DOCUMENT",
            StoreError::Io { .. } => "STORE_IO_ERROR",
            StoreError::Corrupted { .. } => "STORE_CORRUPTED",
        }
    }

    /// Taxonomy category
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::CollectionExists(_) | StoreError::IndexExists { .. } => {
                ErrorCategory::AlreadyExists
            }
            StoreError::IndexConflict { .. } | StoreError::InvalidValidator { .. } => {
                ErrorCategory::ConflictingDefinition
            }
            StoreError::Unavailable(_) => ErrorCategory::ConnectionFailure,
            StoreError::ValidationFailed { .. }
            | StoreError::DuplicateKey { .. }
            | StoreError::InvalidDocument { .. } => ErrorCategory::ValidationRejected,
            StoreError::InvalidCollectionName(_)
            | StoreError::CollectionNotFound(_)
            | StoreError::Io { .. }
            | StoreError::Corrupted { .. } => ErrorCategory::Storage,
        }
    }

    /// Whether the error only reports something that is already in place.
    pub fn is_already_exists(&self) -> bool {
        self.category() == ErrorCategory::AlreadyExists
    }

    /// Whether a document write was refused by a validator or unique index.
    pub fn is_write_rejection(&self) -> bool {
        self.category() == ErrorCategory::ValidationRejected
    }

    /// Validation details, for `ValidationFailed` errors.
    pub fn validation_details(&self) -> Option<&ValidationDetails> {
        match self {
            StoreError::ValidationFailed { details, .. } => Some(details),
            _ => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
