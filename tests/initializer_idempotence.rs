//! Initializer Idempotence Tests
//!
//! - A second run against an initialized database succeeds without changes
//! - Existing collections and identical indexes are tolerated, never recreated
//! - Conflicting definitions abort the run with the raw store error
//! - An unreachable store fails before any step

use std::collections::BTreeMap;
use std::fs;

use costainka::initializer::{InitError, Outcome, SchemaInitializer, Step};
use costainka::store::{
    CollectionInfo, Direction, DocumentStore, ErrorCategory, FileStore, IndexModel, MemoryStore,
};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn snapshot<S: DocumentStore>(store: &S) -> BTreeMap<String, CollectionInfo> {
    store
        .list_collections()
        .unwrap()
        .into_iter()
        .map(|name| {
            let info = store.collection_info(&name).unwrap().unwrap();
            (name, info)
        })
        .collect()
}

// =============================================================================
// Idempotence
// =============================================================================

/// Running twice produces no error and an identical set of collections/indexes.
#[test]
fn test_double_run_is_identical() {
    let mut store = MemoryStore::new("CostaDelInkaDB");
    let initializer = SchemaInitializer::default();

    let first = initializer.run(&mut store).unwrap();
    let after_first = snapshot(&store);

    let second = initializer.run(&mut store).unwrap();
    let after_second = snapshot(&store);

    assert_eq!(after_first, after_second);
    assert_eq!(after_first.len(), 8);
    assert_eq!(first.already_present(), 0);
    assert_eq!(second.created(), 0);
    for collection in &second.collections {
        assert_eq!(collection.outcome, Outcome::AlreadyPresent);
        assert!(collection.validator_applied);
        assert!(collection
            .indexes
            .iter()
            .all(|i| i.outcome == Outcome::AlreadyPresent));
    }
}

/// Index counts per collection match the data model.
#[test]
fn test_index_inventory() {
    let mut store = MemoryStore::new("CostaDelInkaDB");
    SchemaInitializer::default().run(&mut store).unwrap();

    let counts: BTreeMap<String, usize> = snapshot(&store)
        .into_iter()
        .map(|(name, info)| (name, info.indexes.len()))
        .collect();

    let expected: BTreeMap<String, usize> = [
        ("Clientes", 2),
        ("DetallesReserva", 2),
        ("ModalidadesPago", 1),
        ("Pagos", 4),
        ("Reservas", 4),
        ("TiposCliente", 2),
        ("TiposDocumentoPago", 1),
        ("TiposHabitacion", 2),
    ]
    .into_iter()
    .map(|(n, c)| (n.to_string(), c))
    .collect();

    assert_eq!(counts, expected);
}

/// A rerun over a directory-backed database reopened from disk.
#[test]
fn test_rerun_after_reopen() {
    let tmp = TempDir::new().unwrap();
    let before = {
        let mut store = FileStore::open(tmp.path(), "CostaDelInkaDB").unwrap();
        SchemaInitializer::default().run(&mut store).unwrap();
        snapshot(&store)
    };

    let mut store = FileStore::open(tmp.path(), "CostaDelInkaDB").unwrap();
    let report = SchemaInitializer::default().run(&mut store).unwrap();
    assert_eq!(report.created(), 0);
    assert_eq!(snapshot(&store), before);

    let drift = SchemaInitializer::default().verify(&store).unwrap();
    assert!(drift.is_clean(), "{:?}", drift.drifts);
}

/// Existing data survives a rerun; the validator does not judge stored documents.
#[test]
fn test_rerun_keeps_documents() {
    let mut store = MemoryStore::new("CostaDelInkaDB");
    SchemaInitializer::default().run(&mut store).unwrap();
    store
        .insert_one(
            "TiposDocumentoPago",
            json!({"nombre_documento": "Boleta", "activo": true}),
        )
        .unwrap();

    SchemaInitializer::default().run(&mut store).unwrap();
    assert_eq!(store.count_documents("TiposDocumentoPago").unwrap(), 1);
}

// =============================================================================
// Fatal Conditions
// =============================================================================

/// An index with the same keys but different options is a conflicting definition.
#[test]
fn test_conflicting_index_aborts() {
    let mut store = MemoryStore::new("CostaDelInkaDB");
    store
        .create_index(
            "TiposHabitacion",
            IndexModel::on("codigo_interno_tipo", Direction::Ascending).unique(true),
        )
        .unwrap();

    let err = SchemaInitializer::default().run(&mut store).unwrap_err();
    let source = err.store_error().unwrap();
    assert_eq!(source.category(), ErrorCategory::ConflictingDefinition);
    assert!(matches!(
        err,
        InitError::Step {
            step: Step::CreateIndex,
            ..
        }
    ));

    // Earlier collections were applied, later ones were not
    let names = store.list_collections().unwrap();
    assert!(names.contains(&"Pagos".to_string()));
    assert!(!names.contains(&"TiposCliente".to_string()));
}

/// An unreachable store fails with a connection error before any step.
#[test]
fn test_unreachable_store() {
    let tmp = TempDir::new().unwrap();
    let mut store = FileStore::open(tmp.path(), "CostaDelInkaDB").unwrap();
    fs::remove_dir_all(store.root()).unwrap();

    let err = SchemaInitializer::default().run(&mut store).unwrap_err();
    assert!(matches!(err, InitError::Connection { .. }));
    assert_eq!(err.code(), "INIT_CONNECTION_FAILED");
    assert_eq!(
        err.store_error().unwrap().category(),
        ErrorCategory::ConnectionFailure
    );
    assert!(!store.root().exists());
}
