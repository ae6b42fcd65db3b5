//! Schema Constraint Tests
//!
//! Every constraint of the data model, exercised through an initialized
//! store:
//! - Missing required fields are rejected
//! - Declared types are matched exactly (no coercion)
//! - Numeric minimums are enforced and inclusive
//! - Unique indexes reject duplicates; sparse ones skip absent fields
//! - Undeclared fields and dangling references are accepted

use chrono::Utc;
use costainka::document::{date, oid, BsonType, ObjectId};
use costainka::initializer::SchemaInitializer;
use costainka::model::{entities, EntitySchema, FieldSpec};
use costainka::store::{DocumentStore, MemoryStore, StoreError};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn initialized_store() -> MemoryStore {
    let mut store = MemoryStore::new("CostaDelInkaDB");
    SchemaInitializer::default().run(&mut store).unwrap();
    store
}

/// A value of the declared type, distinct per `seed`.
fn sample_value(field: &FieldSpec, seed: i64) -> Value {
    let min = field.minimum.unwrap_or(0);
    match field.bson_type {
        BsonType::String => json!(format!("{}-{}", field.name, seed)),
        BsonType::Int => json!(min + seed),
        BsonType::Double => json!(min as f64 + seed as f64 + 0.5),
        BsonType::Bool => json!(seed % 2 == 0),
        BsonType::Date => date(Utc::now()),
        BsonType::ObjectId => oid(ObjectId::new()),
        BsonType::Array => match field.items {
            Some(BsonType::ObjectId) => json!([oid(ObjectId::new()), oid(ObjectId::new())]),
            _ => json!([format!("https://img.costadelinka.pe/{}.jpg", seed)]),
        },
        other => panic!("no sample for {}", other),
    }
}

/// A value of some other type than the declared one.
fn wrong_type_value(field: &FieldSpec) -> Value {
    match field.bson_type {
        BsonType::String => json!(42),
        BsonType::Int => json!(1.5),
        BsonType::Double => json!(5),
        BsonType::Bool => json!("true"),
        BsonType::Date => json!("2024-05-17"),
        BsonType::ObjectId => json!(ObjectId::new().to_hex()),
        BsonType::Array => json!("not-a-list"),
        other => panic!("no wrong value for {}", other),
    }
}

/// Document with every declared field set.
fn full_document(entity: &EntitySchema, seed: i64) -> Value {
    let mut doc = Map::new();
    for field in entity.fields {
        doc.insert(field.name.to_string(), sample_value(field, seed));
    }
    Value::Object(doc)
}

fn without(mut doc: Value, field: &str) -> Value {
    doc.as_object_mut().unwrap().remove(field);
    doc
}

fn with(mut doc: Value, field: &str, value: Value) -> Value {
    doc[field] = value;
    doc
}

// =============================================================================
// Required Fields
// =============================================================================

/// A document with every declared field is accepted by every collection.
#[test]
fn test_full_documents_accepted() {
    let mut store = initialized_store();
    for entity in entities() {
        let result = store.insert_one(entity.collection, full_document(entity, 1));
        assert!(result.is_ok(), "{}: {:?}", entity.collection, result);
    }
}

/// Removing any required field gets the insert rejected, naming the field.
#[test]
fn test_missing_required_field_rejected() {
    for entity in entities() {
        for field in entity.required_fields() {
            let mut store = initialized_store();
            let doc = without(full_document(entity, 1), field.name);

            let err = store.insert_one(entity.collection, doc).unwrap_err();
            let details = err
                .validation_details()
                .unwrap_or_else(|| panic!("{}.{}: {:?}", entity.collection, field.name, err));
            assert_eq!(details.field, field.name);
            assert_eq!(details.actual, "missing");
            assert_eq!(store.count_documents(entity.collection).unwrap(), 0);
        }
    }
}

/// Optional fields may be left out.
#[test]
fn test_only_required_fields_accepted() {
    let mut store = initialized_store();
    for entity in entities() {
        let mut doc = full_document(entity, 1);
        for field in entity.fields.iter().filter(|f| !f.required) {
            doc = without(doc, field.name);
        }
        assert!(store.insert_one(entity.collection, doc).is_ok(), "{}", entity.collection);
    }
}

// =============================================================================
// Types
// =============================================================================

/// Every declared field rejects a value of another type.
#[test]
fn test_wrong_types_rejected() {
    for entity in entities() {
        for field in entity.fields {
            let mut store = initialized_store();
            let doc = with(full_document(entity, 1), field.name, wrong_type_value(field));

            let err = store.insert_one(entity.collection, doc).unwrap_err();
            assert!(
                matches!(err, StoreError::ValidationFailed { .. }),
                "{}.{}: {:?}",
                entity.collection,
                field.name,
                err
            );
        }
    }
}

/// An integer is not a double: `adr` must carry a fractional representation.
#[test]
fn test_no_numeric_coercion() {
    let mut store = initialized_store();
    let entity = costainka::model::entity("Reservas").unwrap();

    let as_int = with(full_document(entity, 1), "adr", json!(120));
    assert!(store.insert_one("Reservas", as_int).is_err());

    let as_double = with(full_document(entity, 1), "adr", json!(120.0));
    assert!(store.insert_one("Reservas", as_double).is_ok());
}

/// Array elements are checked against `items`.
#[test]
fn test_array_items_checked() {
    let mut store = initialized_store();
    let entity = costainka::model::entity("Clientes").unwrap();
    let doc = with(
        full_document(entity, 1),
        "historial_ids_reservas",
        json!([oid(ObjectId::new()), "r-123"]),
    );

    let err = store.insert_one("Clientes", doc).unwrap_err();
    assert_eq!(
        err.validation_details().unwrap().field,
        "historial_ids_reservas[1]"
    );
}

// =============================================================================
// Numeric Bounds
// =============================================================================

/// Values below a minimum are rejected; the minimum itself is accepted.
#[test]
fn test_numeric_minimums() {
    let mut checked = 0;
    for entity in entities() {
        for field in entity.fields.iter().filter(|f| f.minimum.is_some()) {
            let min = field.minimum.unwrap();
            let (below, at) = match field.bson_type {
                BsonType::Int => (json!(min - 1), json!(min)),
                BsonType::Double => (json!(min as f64 - 0.01), json!(min as f64)),
                other => panic!("minimum on {}", other),
            };

            let mut store = initialized_store();
            let rejected = store.insert_one(entity.collection, with(full_document(entity, 1), field.name, below));
            assert!(
                matches!(rejected, Err(StoreError::ValidationFailed { .. })),
                "{}.{} below minimum",
                entity.collection,
                field.name
            );

            let accepted = store.insert_one(entity.collection, with(full_document(entity, 1), field.name, at));
            assert!(accepted.is_ok(), "{}.{} at minimum: {:?}", entity.collection, field.name, accepted);
            checked += 1;
        }
    }
    assert_eq!(checked, 12);
}

/// Spot checks of the bounds named by the data model.
#[test]
fn test_named_bounds() {
    let mut store = initialized_store();
    let reservas = costainka::model::entity("Reservas").unwrap();
    let rooms = costainka::model::entity("TiposHabitacion").unwrap();

    assert!(store
        .insert_one("Reservas", with(full_document(reservas, 1), "noches_estadia", json!(0)))
        .is_err());
    assert!(store
        .insert_one("Reservas", with(full_document(reservas, 2), "adr", json!(-10.5)))
        .is_err());
    assert!(store
        .insert_one(
            "TiposHabitacion",
            with(full_document(rooms, 1), "capacidad_maxima_adultos", json!(0))
        )
        .is_err());
    assert!(store
        .insert_one(
            "TiposHabitacion",
            with(full_document(rooms, 2), "capacidad_maxima_ninos", json!(-1))
        )
        .is_err());
}

// =============================================================================
// Uniqueness
// =============================================================================

/// For every unique index, a second document with the same key is rejected.
#[test]
fn test_unique_indexes_reject_duplicates() {
    let mut checked = 0;
    for entity in entities() {
        for spec in entity.indexes.iter().filter(|i| i.unique) {
            let mut store = initialized_store();
            let first = full_document(entity, 1);
            let mut second = full_document(entity, 2);
            for (field, _) in spec.keys {
                second[*field] = first[*field].clone();
            }

            store.insert_one(entity.collection, first).unwrap();
            let err = store.insert_one(entity.collection, second).unwrap_err();
            match err {
                StoreError::DuplicateKey { index, .. } => assert_eq!(index, spec.name()),
                other => panic!("{} {}: {:?}", entity.collection, spec.name(), other),
            }
            assert_eq!(store.count_documents(entity.collection).unwrap(), 1);
            checked += 1;
        }
    }
    assert_eq!(checked, 10);
}

/// Sparse unique indexes accept any number of documents without the fields.
#[test]
fn test_sparse_unique_allows_many_absent() {
    for entity in entities() {
        for spec in entity.indexes.iter().filter(|i| i.sparse) {
            let mut store = initialized_store();
            for seed in 1..=3 {
                let mut doc = full_document(entity, seed);
                for (field, _) in spec.keys {
                    doc = without(doc, field);
                }
                assert!(
                    store.insert_one(entity.collection, doc).is_ok(),
                    "{} {} seed {}",
                    entity.collection,
                    spec.name(),
                    seed
                );
            }
            assert_eq!(store.count_documents(entity.collection).unwrap(), 3);
        }
    }
}

/// The identity-document pair is unique as a pair, not per field.
#[test]
fn test_identity_document_pair() {
    let mut store = initialized_store();
    let customer = |email: &str, kind: &str, number: &str| {
        json!({
            "nombre_completo": "Ana Quispe",
            "email": email,
            "tipo_documento_identidad": kind,
            "numero_documento_identidad": number
        })
    };

    store.insert_one("Clientes", customer("a@x.pe", "DNI", "45871236")).unwrap();
    store.insert_one("Clientes", customer("b@x.pe", "PASAPORTE", "45871236")).unwrap();
    store.insert_one("Clientes", customer("c@x.pe", "DNI", "70112233")).unwrap();

    let dup = store.insert_one("Clientes", customer("d@x.pe", "DNI", "45871236"));
    assert!(matches!(dup, Err(StoreError::DuplicateKey { .. })));
}

/// A document with only part of a sparse compound key is still indexed.
#[test]
fn test_partial_compound_key_is_indexed() {
    let mut store = initialized_store();
    let partial = |email: &str| {
        json!({
            "nombre_completo": "Luis Mamani",
            "email": email,
            "tipo_documento_identidad": "CE"
        })
    };

    store.insert_one("Clientes", partial("l1@x.pe")).unwrap();
    let second = store.insert_one("Clientes", partial("l2@x.pe"));
    assert!(matches!(second, Err(StoreError::DuplicateKey { .. })));
}

// =============================================================================
// Open Shape
// =============================================================================

/// Fields not declared by the validator are accepted as-is.
#[test]
fn test_undeclared_fields_accepted() {
    let mut store = initialized_store();
    let doc = json!({
        "nombre_modalidad": "Yape",
        "activo": true,
        "comision_porcentaje": 2.5
    });
    let id = store.insert_one("ModalidadesPago", doc).unwrap();
    let stored = store.find_by_id("ModalidadesPago", &id).unwrap().unwrap();
    assert_eq!(stored["comision_porcentaje"], 2.5);
}

/// Reference fields are not checked against their target collection.
#[test]
fn test_dangling_references_accepted() {
    let mut store = initialized_store();
    let pagos = costainka::model::entity("Pagos").unwrap();
    assert!(store.insert_one("Pagos", full_document(pagos, 1)).is_ok());
    assert_eq!(store.count_documents("Reservas").unwrap(), 0);
}
