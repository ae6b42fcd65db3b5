//! Secondary indexes
//!
//! Index definitions use the document-store vocabulary: an ordered key
//! pattern (`{field: 1 | -1}`) plus `unique` and `sparse` options.
//!
//! Runtime indexes are `BTreeMap<CompositeKey, BTreeSet<ObjectId>>`, rebuilt
//! from the collection's documents whenever it is loaded.
//!
//! # Key semantics
//!
//! - A missing field contributes `Null` to the key
//! - A sparse index skips documents that lack *every* indexed field
//! - A unique index rejects a second document with an equal key, including
//!   an all-`Null` key when the index is not sparse
//! - Integral doubles compare equal to integers (`2.0 == 2`)

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use crate::document::{parse_date, ObjectId};

/// Sort direction of one key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}

impl From<Direction> for i32 {
    fn from(d: Direction) -> Self {
        d.as_i32()
    }
}

impl TryFrom<i32> for Direction {
    type Error = String;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Direction::Ascending),
            -1 => Ok(Direction::Descending),
            other => Err(format!("invalid index direction {}", other)),
        }
    }
}

/// One field of an index key pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexField {
    pub field: String,
    pub direction: Direction,
}

/// Index options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Explicit name; defaults to `<field>_<dir>[_<field>_<dir>...]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub sparse: bool,
}

/// Index definition as passed to `createIndex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexModel {
    pub keys: Vec<IndexField>,
    #[serde(default)]
    pub options: IndexOptions,
}

impl IndexModel {
    /// Starts a key pattern with one field.
    pub fn on(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            keys: vec![IndexField {
                field: field.into(),
                direction,
            }],
            options: IndexOptions::default(),
        }
    }

    /// Appends a field to the key pattern.
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.keys.push(IndexField {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.options.unique = unique;
        self
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.options.sparse = sparse;
        self
    }

    /// Effective index name.
    pub fn name(&self) -> String {
        if let Some(name) = &self.options.name {
            return name.clone();
        }
        self.keys
            .iter()
            .map(|k| format!("{}_{}", k.field, k.direction.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Key pattern document, e.g. `{"fecha_pago": -1}`.
    pub fn key_pattern(&self) -> Value {
        let mut map = Map::new();
        for k in &self.keys {
            map.insert(k.field.clone(), Value::from(k.direction.as_i32()));
        }
        Value::Object(map)
    }

    /// Whether both definitions index the same fields in the same directions.
    pub fn same_keys(&self, other: &IndexModel) -> bool {
        self.keys == other.keys
    }

    /// Whether both definitions are interchangeable (keys, name and options).
    pub fn equivalent(&self, other: &IndexModel) -> bool {
        self.same_keys(other)
            && self.name() == other.name()
            && self.options.unique == other.options.unique
            && self.options.sparse == other.options.sparse
    }

    fn validate_definition(&self, collection: &str) -> StoreResult<()> {
        let conflict = |reason: &str| StoreError::IndexConflict {
            collection: collection.to_string(),
            index: self.name(),
            reason: reason.to_string(),
        };

        if self.keys.is_empty() {
            return Err(conflict("key pattern must not be empty"));
        }
        let mut seen = BTreeSet::new();
        for k in &self.keys {
            if k.field.is_empty() || k.field.starts_with('$') {
                return Err(conflict("invalid key field name"));
            }
            if !seen.insert(k.field.as_str()) {
                return Err(conflict("key pattern repeats a field"));
            }
        }
        Ok(())
    }
}

/// Single component of an index key.
///
/// Ordering follows the document-store type order:
/// Null < numbers < strings < objects < arrays < objectId < bool < date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Null,
    Int(i64),
    /// Float bits remapped for total ordering
    Float(u64),
    String(String),
    /// Canonical JSON of an embedded document
    Object(String),
    /// Canonical JSON of an array
    Array(String),
    ObjectId(ObjectId),
    Bool(bool),
    /// Milliseconds since the epoch
    Date(i64),
}

impl IndexKey {
    /// Create a key from a float
    ///
    /// Integral values fold into `Int` so `2.0` and `2` collide.
    pub fn from_float(v: f64) -> Self {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            return IndexKey::Int(v as i64);
        }
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from an Extended JSON value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => IndexKey::Null,
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    IndexKey::Int(i)
                } else {
                    IndexKey::from_float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => IndexKey::String(s.clone()),
            Value::Array(_) => IndexKey::Array(value.to_string()),
            Value::Object(_) => {
                if let Some(id) = ObjectId::from_json(value) {
                    IndexKey::ObjectId(id)
                } else if let Some(at) = parse_date(value) {
                    IndexKey::Date(at.timestamp_millis())
                } else {
                    IndexKey::Object(value.to_string())
                }
            }
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Null => write!(f, "null"),
            IndexKey::Int(i) => write!(f, "{}", i),
            IndexKey::Float(bits) => {
                let raw = if (bits >> 63) == 1 {
                    bits ^ (1 << 63)
                } else {
                    !bits
                };
                write!(f, "{}", f64::from_bits(raw))
            }
            IndexKey::String(s) => write!(f, "\"{}\"", s),
            IndexKey::Object(json) | IndexKey::Array(json) => write!(f, "{}", json),
            IndexKey::ObjectId(id) => write!(f, "ObjectId('{}')", id),
            IndexKey::Bool(b) => write!(f, "{}", b),
            IndexKey::Date(ms) => write!(f, "Date({})", ms),
        }
    }
}

/// Key of a (possibly compound) index entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(pub Vec<IndexKey>);

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (i, k) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", k)?;
        }
        write!(f, " }}")
    }
}

/// A live index over one collection.
#[derive(Debug, Clone)]
pub(crate) struct CollectionIndex {
    model: IndexModel,
    entries: BTreeMap<CompositeKey, BTreeSet<ObjectId>>,
}

impl CollectionIndex {
    /// Builds an index over existing documents.
    ///
    /// Fails with `DuplicateKey` when a unique index cannot hold the data.
    pub(crate) fn build<'a>(
        collection: &str,
        model: IndexModel,
        documents: impl IntoIterator<Item = (&'a ObjectId, &'a Value)>,
    ) -> StoreResult<Self> {
        model.validate_definition(collection)?;

        let mut index = Self {
            model,
            entries: BTreeMap::new(),
        };
        for (id, doc) in documents {
            index.check_insert(collection, id, doc)?;
            index.insert(*id, doc);
        }
        Ok(index)
    }

    pub(crate) fn model(&self) -> &IndexModel {
        &self.model
    }

    /// Key under which `doc` is indexed; `None` when a sparse index skips it.
    pub(crate) fn key_for(&self, doc: &Value) -> Option<CompositeKey> {
        let mut any_present = false;
        let parts = self
            .model
            .keys
            .iter()
            .map(|k| match lookup_path(doc, &k.field) {
                Some(v) => {
                    any_present = true;
                    IndexKey::from_json(v)
                }
                None => IndexKey::Null,
            })
            .collect();

        if self.model.options.sparse && !any_present {
            return None;
        }
        Some(CompositeKey(parts))
    }

    /// Fails when inserting `doc` would break uniqueness.
    pub(crate) fn check_insert(
        &self,
        collection: &str,
        id: &ObjectId,
        doc: &Value,
    ) -> StoreResult<()> {
        if !self.model.options.unique {
            return Ok(());
        }
        let Some(key) = self.key_for(doc) else {
            return Ok(());
        };
        match self.entries.get(&key) {
            Some(ids) if ids.iter().any(|existing| existing != id) => {
                Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    index: self.model.name(),
                    key: key.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn insert(&mut self, id: ObjectId, doc: &Value) {
        if let Some(key) = self.key_for(doc) {
            self.entries.entry(key).or_default().insert(id);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of indexed entries.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }
}

/// Resolves a dotted path inside a document.
fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, part| current.get(part))
}
