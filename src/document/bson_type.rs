//! BSON type names and their detection over Extended JSON values
//!
//! Mapping (no coercion between numeric types):
//! - integer in i32 range: `int`
//! - any other integer: `long`
//! - non-integral JSON number: `double`
//! - `{"$oid": "<24 hex>"}`: `objectId`
//! - `{"$date": "<RFC 3339>"}` or `{"$date": <millis>}`: `date`

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::object_id::ObjectId;
use super::parse_date;

/// BSON type aliases understood by `$jsonSchema` validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BsonType {
    Double,
    String,
    Object,
    Array,
    ObjectId,
    Bool,
    Date,
    Null,
    Int,
    Long,
}

impl BsonType {
    /// Returns the alias used in `bsonType` keywords.
    pub fn as_str(&self) -> &'static str {
        match self {
            BsonType::Double => "double",
            BsonType::String => "string",
            BsonType::Object => "object",
            BsonType::Array => "array",
            BsonType::ObjectId => "objectId",
            BsonType::Bool => "bool",
            BsonType::Date => "date",
            BsonType::Null => "null",
            BsonType::Int => "int",
            BsonType::Long => "long",
        }
    }

    /// Parses a `bsonType` alias.
    ///
    /// The `number` alias is handled by the validator since it expands to
    /// several types.
    pub fn parse(alias: &str) -> Option<Self> {
        let ty = match alias {
            "double" => BsonType::Double,
            "string" => BsonType::String,
            "object" => BsonType::Object,
            "array" => BsonType::Array,
            "objectId" => BsonType::ObjectId,
            "bool" => BsonType::Bool,
            "date" => BsonType::Date,
            "null" => BsonType::Null,
            "int" => BsonType::Int,
            "long" => BsonType::Long,
            _ => return None,
        };
        Some(ty)
    }

    /// Detects the BSON type of an Extended JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => BsonType::Null,
            Value::Bool(_) => BsonType::Bool,
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i32::try_from(i).is_ok() {
                        BsonType::Int
                    } else {
                        BsonType::Long
                    }
                } else if n.is_u64() {
                    BsonType::Long
                } else {
                    BsonType::Double
                }
            }
            Value::String(_) => BsonType::String,
            Value::Array(_) => BsonType::Array,
            // Malformed `$oid`/`$date` wrappers stay plain objects
            Value::Object(_) => {
                if ObjectId::from_json(value).is_some() {
                    BsonType::ObjectId
                } else if parse_date(value).is_some() {
                    BsonType::Date
                } else {
                    BsonType::Object
                }
            }
        }
    }

    /// Whether the type is numeric (int, long or double).
    pub fn is_numeric(&self) -> bool {
        matches!(self, BsonType::Int | BsonType::Long | BsonType::Double)
    }
}

impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
