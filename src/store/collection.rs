//! In-memory collection state
//!
//! A collection owns its documents (keyed by `_id`), its optional validator
//! and its secondary indexes. Write order for an insert:
//!
//! 1. Shape checks (`_id` assigned or verified)
//! 2. Validator (strict, rejecting)
//! 3. `_id` and unique index checks
//! 4. Document stored, indexes updated
//!
//! A rejected write leaves the collection untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::index::{CollectionIndex, IndexModel};
use super::validator::{SchemaNode, Validator};
use crate::document::{ObjectId, ID_FIELD};

/// Name of the implicit primary key index.
pub const ID_INDEX_NAME: &str = "_id_";

/// Introspection view of one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub key: Value,
    #[serde(flatten)]
    pub model: IndexModel,
    /// Number of documents referenced by the index
    pub entries: usize,
}

/// Introspection view of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub validator: Option<Validator>,
    /// Secondary indexes in creation order (the `_id_` index is implicit)
    pub indexes: Vec<IndexInfo>,
    pub document_count: u64,
}

impl CollectionInfo {
    /// Looks up an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexInfo> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// Validates a collection name.
///
/// Names become directory names in the directory-backed store, so path
/// separators and reserved prefixes are refused.
pub fn check_collection_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name.len() <= 120
        && !name.starts_with("system.")
        && !name.starts_with('.')
        && !name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '$' | '\0') || c.is_control());

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollectionName(name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Collection {
    name: String,
    validator: Option<(Validator, SchemaNode)>,
    indexes: Vec<CollectionIndex>,
    documents: BTreeMap<ObjectId, Value>,
}

impl Collection {
    pub(crate) fn new(name: &str) -> StoreResult<Self> {
        check_collection_name(name)?;
        Ok(Self {
            name: name.to_string(),
            validator: None,
            indexes: Vec::new(),
            documents: BTreeMap::new(),
        })
    }

    /// Rebuilds a collection from persisted parts.
    ///
    /// Documents are not re-validated: validators only judge new writes.
    pub(crate) fn restore(
        name: &str,
        validator: Option<Validator>,
        indexes: Vec<IndexModel>,
        documents: Vec<Value>,
    ) -> StoreResult<Self> {
        let mut collection = Self::new(name)?;

        if let Some(v) = validator {
            collection.set_validator(v)?;
        }

        for doc in documents {
            let id = crate::document::document_id(&doc).ok_or_else(|| StoreError::InvalidDocument {
                collection: name.to_string(),
                reason: "stored document has no object id".into(),
            })?;
            if collection.documents.insert(id, doc).is_some() {
                return Err(StoreError::DuplicateKey {
                    collection: name.to_string(),
                    index: ID_INDEX_NAME.into(),
                    key: id.to_string(),
                });
            }
        }

        for model in indexes {
            let index = CollectionIndex::build(name, model, collection.documents.iter())?;
            collection.indexes.push(index);
        }

        Ok(collection)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref().map(|(v, _)| v)
    }

    pub(crate) fn index_models(&self) -> Vec<IndexModel> {
        self.indexes.iter().map(|i| i.model().clone()).collect()
    }

    pub(crate) fn documents(&self) -> impl Iterator<Item = &Value> {
        self.documents.values()
    }

    pub(crate) fn len(&self) -> u64 {
        self.documents.len() as u64
    }

    pub(crate) fn get(&self, id: &ObjectId) -> Option<&Value> {
        self.documents.get(id)
    }

    /// Installs or replaces the validator.
    pub(crate) fn set_validator(&mut self, validator: Validator) -> StoreResult<()> {
        let compiled = SchemaNode::compile_validator(&self.name, &validator)?;
        self.validator = Some((validator, compiled));
        Ok(())
    }

    /// Creates an index and returns its name.
    pub(crate) fn create_index(&mut self, model: IndexModel) -> StoreResult<String> {
        let name = model.name();

        if name == ID_INDEX_NAME {
            return Err(StoreError::IndexConflict {
                collection: self.name.clone(),
                index: name,
                reason: "the primary key index is implicit".into(),
            });
        }

        for existing in &self.indexes {
            let current = existing.model();
            if current.equivalent(&model) {
                return Err(StoreError::IndexExists {
                    collection: self.name.clone(),
                    index: name,
                });
            }
            if current.name() == name {
                return Err(StoreError::IndexConflict {
                    collection: self.name.clone(),
                    index: name,
                    reason: "an index with this name exists with different keys or options".into(),
                });
            }
            if current.same_keys(&model) {
                return Err(StoreError::IndexConflict {
                    collection: self.name.clone(),
                    index: name,
                    reason: format!(
                        "index '{}' already uses this key pattern with different options",
                        current.name()
                    ),
                });
            }
        }

        let index = CollectionIndex::build(&self.name, model, self.documents.iter())?;
        self.indexes.push(index);
        Ok(name)
    }

    /// Inserts a document, assigning `_id` when absent.
    pub(crate) fn insert(&mut self, mut document: Value) -> StoreResult<ObjectId> {
        let id = self.prepare_id(&mut document)?;

        if let Some((_, compiled)) = &self.validator {
            compiled
                .validate(&document)
                .map_err(|details| StoreError::ValidationFailed {
                    collection: self.name.clone(),
                    details,
                })?;
        }

        if self.documents.contains_key(&id) {
            return Err(StoreError::DuplicateKey {
                collection: self.name.clone(),
                index: ID_INDEX_NAME.into(),
                key: format!("{{ ObjectId('{}') }}", id),
            });
        }

        for index in &self.indexes {
            index.check_insert(&self.name, &id, &document)?;
        }

        for index in &mut self.indexes {
            index.insert(id, &document);
        }
        self.documents.insert(id, document);

        Ok(id)
    }

    /// Removes every document, keeping validator and indexes.
    pub(crate) fn delete_all(&mut self) -> u64 {
        let removed = self.len();
        self.documents.clear();
        for index in &mut self.indexes {
            index.clear();
        }
        removed
    }

    pub(crate) fn info(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.name.clone(),
            validator: self.validator().cloned(),
            indexes: self
                .indexes
                .iter()
                .map(|i| IndexInfo {
                    name: i.model().name(),
                    key: i.model().key_pattern(),
                    model: i.model().clone(),
                    entries: i.len(),
                })
                .collect(),
            document_count: self.len(),
        }
    }

    fn prepare_id(&self, document: &mut Value) -> StoreResult<ObjectId> {
        let obj = document
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument {
                collection: self.name.clone(),
                reason: "document must be an object".into(),
            })?;

        match obj.get(ID_FIELD) {
            None => {
                let id = ObjectId::new();
                obj.insert(ID_FIELD.to_string(), id.to_json());
                Ok(id)
            }
            Some(value) => ObjectId::from_json(value).ok_or_else(|| StoreError::InvalidDocument {
                collection: self.name.clone(),
                reason: format!("_id must be an object id, got {}", value),
            }),
        }
    }
}
