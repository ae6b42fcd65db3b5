//! Process-local store engine

use std::collections::BTreeMap;

use serde_json::Value;

use super::collection::{Collection, CollectionInfo};
use super::errors::{StoreError, StoreResult};
use super::index::IndexModel;
use super::validator::Validator;
use super::DocumentStore;
use crate::document::ObjectId;

/// In-memory document store.
///
/// Holds one database. Nothing survives the process.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    database: String,
    collections: BTreeMap<String, Collection>,
}

impl MemoryStore {
    /// Creates an empty database.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: BTreeMap::new(),
        }
    }

    pub(crate) fn from_collections(
        database: impl Into<String>,
        collections: impl IntoIterator<Item = Collection>,
    ) -> Self {
        Self {
            database: database.into(),
            collections: collections
                .into_iter()
                .map(|c| (c.name().to_string(), c))
                .collect(),
        }
    }

    pub(crate) fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Puts back a previously cloned collection state.
    pub(crate) fn restore_collection(&mut self, name: &str, previous: Option<Collection>) {
        match previous {
            Some(collection) => {
                self.collections.insert(name.to_string(), collection);
            }
            None => {
                self.collections.remove(name);
            }
        }
    }

    fn collection_or_create(&mut self, name: &str) -> StoreResult<&mut Collection> {
        if !self.collections.contains_key(name) {
            let collection = Collection::new(name)?;
            self.collections.insert(name.to_string(), collection);
        }
        self.collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn create_collection(&mut self, name: &str) -> StoreResult<()> {
        if self.collections.contains_key(name) {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        let collection = Collection::new(name)?;
        self.collections.insert(name.to_string(), collection);
        Ok(())
    }

    fn set_validator(&mut self, name: &str, validator: Validator) -> StoreResult<()> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?
            .set_validator(validator)
    }

    fn create_index(&mut self, name: &str, index: IndexModel) -> StoreResult<String> {
        self.collection_or_create(name)?.create_index(index)
    }

    fn insert_one(&mut self, name: &str, document: Value) -> StoreResult<ObjectId> {
        self.collection_or_create(name)?.insert(document)
    }

    fn delete_all(&mut self, name: &str) -> StoreResult<u64> {
        Ok(self
            .collections
            .get_mut(name)
            .map(Collection::delete_all)
            .unwrap_or(0))
    }

    fn count_documents(&self, name: &str) -> StoreResult<u64> {
        Ok(self.collections.get(name).map(Collection::len).unwrap_or(0))
    }

    fn find_by_id(&self, name: &str, id: &ObjectId) -> StoreResult<Option<Value>> {
        Ok(self
            .collections
            .get(name)
            .and_then(|c| c.get(id))
            .cloned())
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(self.collections.keys().cloned().collect())
    }

    fn collection_info(&self, name: &str) -> StoreResult<Option<CollectionInfo>> {
        Ok(self.collections.get(name).map(Collection::info))
    }
}
