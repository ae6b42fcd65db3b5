//! Entity descriptor types
//!
//! Descriptors are `const`-constructible so the whole data model can live in
//! static tables.

use serde::Serialize;

use crate::document::BsonType;
use crate::store::{Direction, IndexModel};

/// Declared field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub bson_type: BsonType,
    pub required: bool,
    /// Inclusive lower bound for numeric fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    /// Element type for array fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<BsonType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl FieldSpec {
    /// Create a required field
    pub const fn required(name: &'static str, bson_type: BsonType) -> Self {
        Self {
            name,
            bson_type,
            required: true,
            minimum: None,
            items: None,
            description: None,
        }
    }

    /// Create an optional field
    pub const fn optional(name: &'static str, bson_type: BsonType) -> Self {
        Self {
            name,
            bson_type,
            required: false,
            minimum: None,
            items: None,
            description: None,
        }
    }

    pub const fn minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub const fn items(mut self, items: BsonType) -> Self {
        self.items = Some(items);
        self
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Declared index of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub keys: &'static [(&'static str, Direction)],
    pub unique: bool,
    pub sparse: bool,
}

impl IndexSpec {
    /// Plain (non-unique) index
    pub const fn plain(keys: &'static [(&'static str, Direction)]) -> Self {
        Self {
            keys,
            unique: false,
            sparse: false,
        }
    }

    /// Unique index; a missing field counts as null
    pub const fn unique(keys: &'static [(&'static str, Direction)]) -> Self {
        Self {
            keys,
            unique: true,
            sparse: false,
        }
    }

    /// Unique index ignoring documents that lack every indexed field
    pub const fn unique_sparse(keys: &'static [(&'static str, Direction)]) -> Self {
        Self {
            keys,
            unique: true,
            sparse: true,
        }
    }

    /// Store-level index definition.
    pub fn to_model(&self) -> IndexModel {
        let mut keys = self.keys.iter();
        let mut model = match keys.next() {
            Some((field, direction)) => IndexModel::on(*field, *direction),
            None => IndexModel {
                keys: Vec::new(),
                options: Default::default(),
            },
        };
        for (field, direction) in keys {
            model = model.then(*field, *direction);
        }
        model.unique(self.unique).sparse(self.sparse)
    }

    /// Default index name, e.g. `fecha_pago_-1`.
    pub fn name(&self) -> String {
        self.to_model().name()
    }
}

/// Role of an entity in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Customers, reservations and payments
    Transactional,
    /// Small lookup tables referenced by transactional entities
    Catalog,
}

/// One collection of the data model: its fields and its indexes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntitySchema {
    /// Collection name (persisted contract)
    pub collection: &'static str,
    /// English entity name
    pub entity: &'static str,
    pub kind: EntityKind,
    /// `$jsonSchema` title
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
    pub indexes: &'static [IndexSpec],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Required fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Store-level index definitions in declaration order.
    pub fn index_models(&self) -> Vec<IndexModel> {
        self.indexes.iter().map(IndexSpec::to_model).collect()
    }
}
