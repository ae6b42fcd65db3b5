//! Directory-backed store engine
//!
//! Layout:
//!
//! ```text
//! <data_dir>/<database>/
//! ├── Clientes/
//! │   ├── collection.json   (validator, indexes, count, checksum)
//! │   └── documents.json    (array of documents)
//! └── ...
//! ```
//!
//! Every mutation rewrites the affected collection's files: both are staged
//! as fsynced `*.json.tmp` files, then `documents.json` is renamed into
//! place before `collection.json`. A failed write re-persists the previous
//! state. A crash between the two renames is reported as corruption on the
//! next open.
//!
//! On open, each collection is loaded, checksum-verified and its indexes are
//! rebuilt from the documents.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::checksum::{check_documents, documents_crc32};
use super::collection::{check_collection_name, Collection, CollectionInfo};
use super::errors::{StoreError, StoreResult};
use super::index::IndexModel;
use super::memory::MemoryStore;
use super::validator::Validator;
use super::DocumentStore;
use crate::document::ObjectId;

const MANIFEST_FILE: &str = "collection.json";
const DOCUMENTS_FILE: &str = "documents.json";
const FORMAT_VERSION: u32 = 1;

/// Persisted per-collection manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionManifest {
    format_version: u32,
    name: String,
    #[serde(default)]
    validator: Option<Validator>,
    #[serde(default)]
    indexes: Vec<IndexModel>,
    document_count: u64,
    documents_crc32: u32,
}

/// Document store persisted under `<data_dir>/<database>`.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Opens (creating if needed) the database directory and loads every
    /// collection in it.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the database directory cannot be created or read
    /// - `Corrupted` if a collection fails its checksum or cannot be parsed
    pub fn open(data_dir: &Path, database: &str) -> StoreResult<Self> {
        let root = database_root(data_dir, database)?;
        fs::create_dir_all(&root).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {}", root.display(), e))
        })?;
        Self::load(root, database)
    }

    /// Opens a database directory that must already exist.
    ///
    /// Nothing is created on disk; a missing directory is `Unavailable`.
    pub fn open_existing(data_dir: &Path, database: &str) -> StoreResult<Self> {
        let root = database_root(data_dir, database)?;
        if !root.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "database directory {} does not exist",
                root.display()
            )));
        }
        Self::load(root, database)
    }

    fn load(root: PathBuf, database: &str) -> StoreResult<Self> {
        let mut collections = Vec::new();
        for dir in collection_dirs(&root)? {
            if !dir.join(MANIFEST_FILE).exists() {
                tracing::warn!(
                    event = "COLLECTION_DIR_SKIPPED",
                    path = %dir.display(),
                    reason = "no manifest"
                );
                continue;
            }
            collections.push(load_collection(&dir)?);
        }

        tracing::debug!(
            event = "STORE_OPENED",
            path = %root.display(),
            collections = collections.len()
        );

        Ok(Self {
            inner: MemoryStore::from_collections(database, collections),
            root,
        })
    }

    /// Directory holding this database's collections.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Applies a mutation to one collection and persists it.
    ///
    /// If persisting fails, the in-memory state is rolled back and the
    /// previous state is written again, so a failed write leaves both memory
    /// and disk as they were.
    fn mutate<T>(
        &mut self,
        name: &str,
        op: impl FnOnce(&mut MemoryStore) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let previous = self.inner.collection(name).cloned();
        let out = op(&mut self.inner)?;

        if let Err(e) = self.persist(name) {
            self.inner.restore_collection(name, previous);
            if let Err(restore) = self.persist(name) {
                tracing::error!(
                    event = "COLLECTION_RESTORE_FAILED",
                    collection = name,
                    error = %restore
                );
            }
            return Err(e);
        }
        Ok(out)
    }

    fn persist(&self, name: &str) -> StoreResult<()> {
        let Some(collection) = self.inner.collection(name) else {
            return Ok(());
        };

        let dir = self.root.join(name);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let documents: Vec<&Value> = collection.documents().collect();
        let documents_bytes = serde_json::to_vec(&documents).map_err(|e| {
            StoreError::corrupted(dir.join(DOCUMENTS_FILE), format!("serialize: {}", e))
        })?;

        let manifest = CollectionManifest {
            format_version: FORMAT_VERSION,
            name: name.to_string(),
            validator: collection.validator().cloned(),
            indexes: collection.index_models(),
            document_count: collection.len(),
            documents_crc32: documents_crc32(&documents_bytes),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| {
            StoreError::corrupted(dir.join(MANIFEST_FILE), format!("serialize: {}", e))
        })?;

        let documents_path = dir.join(DOCUMENTS_FILE);
        let manifest_path = dir.join(MANIFEST_FILE);

        // Both files are staged before either is renamed into place
        let staged_documents = stage(&documents_path, &documents_bytes)?;
        let staged_manifest = match stage(&manifest_path, &manifest_bytes) {
            Ok(staged) => staged,
            Err(e) => {
                discard(&staged_documents);
                return Err(e);
            }
        };

        if let Err(e) = commit(&staged_documents, &documents_path) {
            discard(&staged_documents);
            discard(&staged_manifest);
            return Err(e);
        }
        commit(&staged_manifest, &manifest_path)
    }
}

impl DocumentStore for FileStore {
    fn database_name(&self) -> &str {
        self.inner.database_name()
    }

    fn ping(&self) -> StoreResult<()> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(StoreError::Unavailable(format!(
                "cannot reach {}: {}",
                self.root.display(),
                e
            ))),
        }
    }

    fn create_collection(&mut self, name: &str) -> StoreResult<()> {
        self.mutate(name, |s| s.create_collection(name))
    }

    fn set_validator(&mut self, name: &str, validator: Validator) -> StoreResult<()> {
        self.mutate(name, |s| s.set_validator(name, validator))
    }

    fn create_index(&mut self, name: &str, index: IndexModel) -> StoreResult<String> {
        self.mutate(name, |s| s.create_index(name, index))
    }

    fn insert_one(&mut self, name: &str, document: Value) -> StoreResult<ObjectId> {
        self.mutate(name, |s| s.insert_one(name, document))
    }

    fn delete_all(&mut self, name: &str) -> StoreResult<u64> {
        self.mutate(name, |s| s.delete_all(name))
    }

    fn count_documents(&self, name: &str) -> StoreResult<u64> {
        self.inner.count_documents(name)
    }

    fn find_by_id(&self, name: &str, id: &ObjectId) -> StoreResult<Option<Value>> {
        self.inner.find_by_id(name, id)
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.inner.list_collections()
    }

    fn collection_info(&self, name: &str) -> StoreResult<Option<CollectionInfo>> {
        self.inner.collection_info(name)
    }
}

/// Sub-directories of the database root, sorted by name.
fn collection_dirs(root: &Path) -> StoreResult<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|e| {
        StoreError::Unavailable(format!("cannot read {}: {}", root.display(), e))
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(root, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn load_collection(dir: &Path) -> StoreResult<Collection> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_bytes = fs::read(&manifest_path).map_err(|e| StoreError::io(&manifest_path, e))?;
    let manifest: CollectionManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| StoreError::corrupted(&manifest_path, format!("invalid manifest: {}", e)))?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(StoreError::corrupted(
            &manifest_path,
            format!("unsupported format version {}", manifest.format_version),
        ));
    }

    let dir_name = dir.file_name().map(|n| n.to_string_lossy().into_owned());
    if dir_name.as_deref() != Some(manifest.name.as_str()) {
        return Err(StoreError::corrupted(
            &manifest_path,
            format!("manifest names '{}' but lives in another directory", manifest.name),
        ));
    }

    let documents_path = dir.join(DOCUMENTS_FILE);
    let documents_bytes = fs::read(&documents_path).map_err(|e| StoreError::io(&documents_path, e))?;
    check_documents(&documents_path, &documents_bytes, manifest.documents_crc32)?;

    let documents: Vec<Value> = serde_json::from_slice(&documents_bytes)
        .map_err(|e| StoreError::corrupted(&documents_path, format!("invalid documents: {}", e)))?;
    if documents.len() as u64 != manifest.document_count {
        return Err(StoreError::corrupted(
            &documents_path,
            format!(
                "manifest records {} documents, file holds {}",
                manifest.document_count,
                documents.len()
            ),
        ));
    }

    Collection::restore(&manifest.name, manifest.validator, manifest.indexes, documents).map_err(
        |e| match e {
            StoreError::Io { .. } | StoreError::Corrupted { .. } => e,
            other => StoreError::corrupted(dir, other.to_string()),
        },
    )
}

/// Rejects database names that would escape the data directory.
fn database_root(data_dir: &Path, database: &str) -> StoreResult<PathBuf> {
    check_collection_name(database).map_err(|_| {
        StoreError::Unavailable(format!("invalid database name '{}'", database))
    })?;
    Ok(data_dir.join(database))
}

/// Writes `bytes` next to `path` as `*.json.tmp` and fsyncs it.
fn stage(path: &Path, bytes: &[u8]) -> StoreResult<PathBuf> {
    let tmp = path.with_extension("json.tmp");

    let mut file: File = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io(&tmp, e))?;
    file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;

    Ok(tmp)
}

fn commit(staged: &Path, path: &Path) -> StoreResult<()> {
    fs::rename(staged, path).map_err(|e| StoreError::io(path, e))
}

/// Best-effort removal of a staged file that will not be committed.
fn discard(staged: &Path) {
    if let Err(e) = fs::remove_file(staged) {
        tracing::debug!(event = "STAGED_FILE_LEFT", path = %staged.display(), error = %e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Direction;
    use serde_json::json;
    use tempfile::TempDir;

    fn open(tmp: &TempDir) -> FileStore {
        FileStore::open(tmp.path(), "CostaDelInkaDB").unwrap()
    }

    #[test]
    fn test_state_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let id = {
            let mut store = open(&tmp);
            store.create_collection("TiposCliente").unwrap();
            store
                .set_validator(
                    "TiposCliente",
                    Validator::strict(json!({"required": ["nombre_tipo_cliente"]})),
                )
                .unwrap();
            store
                .create_index(
                    "TiposCliente",
                    IndexModel::on("nombre_tipo_cliente", Direction::Ascending).unique(true),
                )
                .unwrap();
            store
                .insert_one("TiposCliente", json!({"nombre_tipo_cliente": "Transitorio"}))
                .unwrap()
        };

        let mut store = open(&tmp);
        assert_eq!(store.list_collections().unwrap(), vec!["TiposCliente"]);
        assert!(store.find_by_id("TiposCliente", &id).unwrap().is_some());

        let info = store.collection_info("TiposCliente").unwrap().unwrap();
        assert!(info.validator.is_some());
        assert_eq!(info.indexes.len(), 1);

        // Rebuilt unique index still enforced
        let dup = store.insert_one("TiposCliente", json!({"nombre_tipo_cliente": "Transitorio"}));
        assert!(matches!(dup, Err(StoreError::DuplicateKey { .. })));
        // Rebuilt validator still enforced
        assert!(store.insert_one("TiposCliente", json!({"x": 1})).is_err());
    }

    #[test]
    fn test_rejected_write_not_persisted() {
        let tmp = TempDir::new().unwrap();
        {
            let mut store = open(&tmp);
            store.create_collection("Pagos").unwrap();
            store
                .set_validator("Pagos", Validator::strict(json!({"required": ["moneda"]})))
                .unwrap();
            assert!(store.insert_one("Pagos", json!({"monto_total": 10.5})).is_err());
        }
        let store = open(&tmp);
        assert_eq!(store.count_documents("Pagos").unwrap(), 0);
    }

    #[test]
    fn test_checksum_mismatch_refuses_open() {
        let tmp = TempDir::new().unwrap();
        {
            let mut store = open(&tmp);
            store.insert_one("Clientes", json!({"email": "a@x.pe"})).unwrap();
        }
        let docs_path = tmp.path().join("CostaDelInkaDB").join("Clientes").join(DOCUMENTS_FILE);
        let tampered = fs::read_to_string(&docs_path).unwrap().replace("a@x.pe", "b@x.pe");
        fs::write(&docs_path, tampered).unwrap();

        let result = FileStore::open(tmp.path(), "CostaDelInkaDB");
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn test_directories_without_manifest_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("CostaDelInkaDB").join("stray")).unwrap();
        let store = open(&tmp);
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_ping_fails_when_root_disappears() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        assert!(store.ping().is_ok());
        fs::remove_dir_all(store.root()).unwrap();
        assert!(matches!(store.ping(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_failed_manifest_write_leaves_disk_unchanged() {
        let tmp = TempDir::new().unwrap();
        let mut store = open(&tmp);
        store.insert_one("Clientes", json!({"email": "a@x.pe"})).unwrap();

        // A directory in the way of the staged manifest makes the write fail
        let blocker = store.root().join("Clientes").join("collection.json.tmp");
        fs::create_dir(&blocker).unwrap();

        let result = store.insert_one("Clientes", json!({"email": "b@x.pe"}));
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(store.count_documents("Clientes").unwrap(), 1);
        drop(store);

        fs::remove_dir(&blocker).unwrap();
        assert!(!tmp
            .path()
            .join("CostaDelInkaDB")
            .join("Clientes")
            .join("documents.json.tmp")
            .exists());

        let store = open(&tmp);
        assert_eq!(store.count_documents("Clientes").unwrap(), 1);
    }

    #[test]
    fn test_open_existing_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let result = FileStore::open_existing(tmp.path(), "CostaDelInkaDB");
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(!tmp.path().join("CostaDelInkaDB").exists());

        open(&tmp);
        let store = FileStore::open_existing(tmp.path(), "CostaDelInkaDB").unwrap();
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_database_name() {
        let tmp = TempDir::new().unwrap();
        let result = FileStore::open(tmp.path(), "../elsewhere");
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
