//! Initializer and verification reports

use serde::Serialize;

use crate::store::IndexModel;

/// What happened to a collection or index during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    /// Already present; the store's "already exists" error was tolerated
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub collection: String,
    pub outcome: Outcome,
    pub validator_applied: bool,
    pub indexes: Vec<IndexReport>,
}

/// Result of a successful initializer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub database: String,
    pub collections: Vec<CollectionReport>,
    pub elapsed_ms: u64,
}

impl InitReport {
    /// Final confirmation line printed after every step succeeded.
    pub fn confirmation_message(&self) -> String {
        format!(
            "Base de datos {} y colecciones creadas con validadores e índices.",
            self.database
        )
    }

    /// Number of collections and indexes created by this run.
    pub fn created(&self) -> usize {
        self.count(Outcome::Created)
    }

    /// Number of collections and indexes that were already in place.
    pub fn already_present(&self) -> usize {
        self.count(Outcome::AlreadyPresent)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.collections
            .iter()
            .map(|c| {
                usize::from(c.outcome == outcome)
                    + c.indexes.iter().filter(|i| i.outcome == outcome).count()
            })
            .sum()
    }
}

/// One difference between the live store and the data model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drift {
    MissingCollection {
        collection: String,
    },
    MissingValidator {
        collection: String,
    },
    /// A validator is installed but differs from the data model
    ValidatorMismatch {
        collection: String,
    },
    MissingIndex {
        collection: String,
        index: String,
    },
    /// Same name or key pattern, different keys or options
    IndexMismatch {
        collection: String,
        index: String,
        expected: IndexModel,
        actual: IndexModel,
    },
}

impl Drift {
    pub fn collection(&self) -> &str {
        match self {
            Drift::MissingCollection { collection }
            | Drift::MissingValidator { collection }
            | Drift::ValidatorMismatch { collection }
            | Drift::MissingIndex { collection, .. }
            | Drift::IndexMismatch { collection, .. } => collection,
        }
    }
}

/// Result of a verification pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub database: String,
    pub checked: usize,
    pub drifts: Vec<Drift>,
}

impl DriftReport {
    /// True when the store matches the data model.
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty()
    }
}
