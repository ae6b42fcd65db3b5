//! Document store subsystem
//!
//! A strict embedded document store speaking the command vocabulary of a
//! MongoDB-style database: create-collection, `collMod` validators,
//! create-index, insert, delete and introspection.
//!
//! # Engines
//!
//! - [`MemoryStore`]: process-local, for tests and dry runs
//! - [`FileStore`]: directory-backed, one sub-directory per collection
//!
//! # Guarantees
//!
//! - Validators reject non-conforming writes (no coercion, no defaults)
//! - Unique indexes reject duplicate keys; sparse indexes skip documents
//!   lacking every indexed field
//! - Referential integrity is NOT enforced: object id fields pointing at
//!   other collections are plain values
//! - Operations are synchronous and single-threaded; the caller owns the
//!   handle (`&mut`) for the whole session

mod checksum;
mod collection;
mod errors;
mod file;
mod index;
mod memory;
mod validator;

pub use collection::{check_collection_name, CollectionInfo, IndexInfo, ID_INDEX_NAME};
pub use errors::{ErrorCategory, StoreError, StoreResult, ValidationDetails};
pub use file::FileStore;
pub use index::{CompositeKey, Direction, IndexField, IndexKey, IndexModel, IndexOptions};
pub use memory::MemoryStore;
pub use validator::{ValidationAction, ValidationLevel, Validator, JSON_SCHEMA_KEY};

use serde_json::Value;

use crate::document::ObjectId;

/// Handle on one database of a document store.
pub trait DocumentStore {
    /// Name of the selected database.
    fn database_name(&self) -> &str;

    /// Checks that the store is reachable.
    fn ping(&self) -> StoreResult<()>;

    /// Creates an empty collection.
    ///
    /// Fails with `CollectionExists` when the name is taken.
    fn create_collection(&mut self, name: &str) -> StoreResult<()>;

    /// Installs or replaces a collection's validator (`collMod`).
    ///
    /// Fails with `CollectionNotFound` when the collection does not exist.
    fn set_validator(&mut self, name: &str, validator: Validator) -> StoreResult<()>;

    /// Creates an index and returns its name.
    ///
    /// Creates the collection implicitly. Fails with `IndexExists` when an
    /// identical index is present and `IndexConflict` when the name or key
    /// pattern is taken with different options.
    fn create_index(&mut self, name: &str, index: IndexModel) -> StoreResult<String>;

    /// Inserts a document and returns its `_id`.
    ///
    /// Assigns `_id` when absent and creates the collection implicitly.
    fn insert_one(&mut self, name: &str, document: Value) -> StoreResult<ObjectId>;

    /// Removes every document of a collection; a missing collection counts 0.
    fn delete_all(&mut self, name: &str) -> StoreResult<u64>;

    /// Number of documents; a missing collection counts 0.
    fn count_documents(&self, name: &str) -> StoreResult<u64>;

    /// Fetches a document by `_id`.
    fn find_by_id(&self, name: &str, id: &ObjectId) -> StoreResult<Option<Value>>;

    /// Collection names, sorted.
    fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Validator and indexes of a collection, `None` when it does not exist.
    fn collection_info(&self, name: &str) -> StoreResult<Option<CollectionInfo>>;
}
