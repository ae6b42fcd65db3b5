//! `$jsonSchema` collection validators
//!
//! A collection validator is the `{"$jsonSchema": {...}}` document installed
//! with `collMod`, together with its validation level and action.
//!
//! Supported keywords: `bsonType`, `required`, `properties`, `minimum`,
//! `items`, `title`, `description`. Anything else makes the validator
//! invalid instead of being silently ignored.
//!
//! Validation semantics:
//! - Every name in `required` must be present
//! - Declared properties must match their `bsonType` exactly (no coercion)
//! - `minimum` applies to numeric values only
//! - Undeclared properties are allowed
//! - Validation is deterministic and never mutates the document

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::errors::{StoreError, StoreResult, ValidationDetails};
use crate::document::BsonType;

/// Key under which the schema sits inside the validator document.
pub const JSON_SCHEMA_KEY: &str = "$jsonSchema";

/// Which writes the validator applies to.
///
/// Only `strict` is supported: a manifest or command naming another level
/// fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// All inserts and updates
    #[default]
    Strict,
}

/// What happens to a violating write. Only rejection is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationAction {
    /// Reject the write
    #[default]
    Error,
}

/// Collection validator as installed with `collMod`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    /// The `{"$jsonSchema": {...}}` document
    pub validator: Value,
    #[serde(default)]
    pub validation_level: ValidationLevel,
    #[serde(default)]
    pub validation_action: ValidationAction,
}

impl Validator {
    /// Strict, rejecting validator around a `$jsonSchema` body.
    pub fn strict(json_schema: Value) -> Self {
        Self {
            validator: json!({ JSON_SCHEMA_KEY: json_schema }),
            validation_level: ValidationLevel::Strict,
            validation_action: ValidationAction::Error,
        }
    }

    /// The `$jsonSchema` body, if present.
    pub fn json_schema(&self) -> Option<&Value> {
        self.validator.get(JSON_SCHEMA_KEY)
    }

    /// The `collMod` command that installs this validator on `collection`.
    pub fn coll_mod_command(&self, collection: &str) -> Value {
        json!({
            "collMod": collection,
            "validator": self.validator,
            "validationLevel": self.validation_level,
            "validationAction": self.validation_action,
        })
    }
}

/// Compiled `$jsonSchema` node.
#[derive(Debug, Clone, Default)]
pub(crate) struct SchemaNode {
    /// Allowed types; `None` accepts any type
    bson_types: Option<Vec<BsonType>>,
    required: Vec<String>,
    properties: BTreeMap<String, SchemaNode>,
    minimum: Option<f64>,
    items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    /// Compiles a validator for `collection`.
    pub(crate) fn compile_validator(collection: &str, validator: &Validator) -> StoreResult<Self> {
        let invalid = |reason: String| StoreError::InvalidValidator {
            collection: collection.to_string(),
            reason,
        };

        let obj = validator
            .validator
            .as_object()
            .ok_or_else(|| invalid("validator must be a document".into()))?;

        if obj.len() != 1 {
            return Err(invalid(format!(
                "validator must contain exactly one '{}' key",
                JSON_SCHEMA_KEY
            )));
        }

        let schema = obj
            .get(JSON_SCHEMA_KEY)
            .ok_or_else(|| invalid(format!("only '{}' validators are supported", JSON_SCHEMA_KEY)))?;

        Self::compile(schema, "$jsonSchema").map_err(invalid)
    }

    fn compile(schema: &Value, path: &str) -> Result<Self, String> {
        let obj = schema
            .as_object()
            .ok_or_else(|| format!("{}: schema must be a document", path))?;

        let mut node = SchemaNode::default();

        for (keyword, value) in obj {
            match keyword.as_str() {
                "bsonType" => node.bson_types = Some(compile_bson_type(value, path)?),
                "required" => node.required = compile_required(value, path)?,
                "properties" => {
                    let props = value
                        .as_object()
                        .ok_or_else(|| format!("{}.properties must be a document", path))?;
                    for (name, sub) in props {
                        let sub_path = format!("{}.properties.{}", path, name);
                        node.properties.insert(name.clone(), Self::compile(sub, &sub_path)?);
                    }
                }
                "minimum" => {
                    let min = value
                        .as_f64()
                        .ok_or_else(|| format!("{}.minimum must be a number", path))?;
                    node.minimum = Some(min);
                }
                "items" => {
                    let sub_path = format!("{}.items", path);
                    node.items = Some(Box::new(Self::compile(value, &sub_path)?));
                }
                "title" | "description" => {
                    if !value.is_string() {
                        return Err(format!("{}.{} must be a string", path, keyword));
                    }
                }
                other => return Err(format!("{}: unsupported keyword '{}'", path, other)),
            }
        }

        Ok(node)
    }

    /// Validates a whole document.
    pub(crate) fn validate(&self, document: &Value) -> Result<(), ValidationDetails> {
        self.validate_value(document, "")
    }

    fn validate_value(&self, value: &Value, path: &str) -> Result<(), ValidationDetails> {
        let actual = BsonType::of(value);

        if let Some(types) = &self.bson_types {
            if !types.contains(&actual) {
                return Err(ValidationDetails::type_mismatch(
                    display_path(path),
                    expected_types(types),
                    actual.as_str(),
                ));
            }
        }

        if let (Some(min), true) = (self.minimum, actual.is_numeric()) {
            if let Some(n) = value.as_f64() {
                if n < min {
                    return Err(ValidationDetails::below_minimum(
                        display_path(path),
                        min,
                        value.to_string(),
                    ));
                }
            }
        }

        // Extended JSON wrappers are leaves, not sub-documents
        if actual == BsonType::Object {
            if let Some(obj) = value.as_object() {
                self.validate_object(obj, path)?;
            }
        }

        if let (Some(items), Some(arr)) = (&self.items, value.as_array()) {
            for (i, elem) in arr.iter().enumerate() {
                let elem_path = format!("{}[{}]", display_path(path), i);
                items.validate_value(elem, &elem_path)?;
            }
        }

        Ok(())
    }

    fn validate_object(&self, obj: &Map<String, Value>, path: &str) -> Result<(), ValidationDetails> {
        for name in &self.required {
            if !obj.contains_key(name) {
                return Err(ValidationDetails::missing_field(make_path(path, name)));
            }
        }

        for (name, sub) in &self.properties {
            if let Some(value) = obj.get(name) {
                sub.validate_value(value, &make_path(path, name))?;
            }
        }

        Ok(())
    }
}

fn compile_bson_type(value: &Value, path: &str) -> Result<Vec<BsonType>, String> {
    let aliases: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(arr) => arr
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| format!("{}.bsonType entries must be strings", path))
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(format!("{}.bsonType must be a string or array", path)),
    };

    let mut types = Vec::new();
    for alias in aliases {
        if alias == "number" {
            types.extend([BsonType::Int, BsonType::Long, BsonType::Double]);
            continue;
        }
        let ty = BsonType::parse(alias)
            .ok_or_else(|| format!("{}: unknown bsonType '{}'", path, alias))?;
        types.push(ty);
    }

    if types.is_empty() {
        return Err(format!("{}.bsonType must not be empty", path));
    }
    Ok(types)
}

fn compile_required(value: &Value, path: &str) -> Result<Vec<String>, String> {
    let arr = value
        .as_array()
        .ok_or_else(|| format!("{}.required must be an array", path))?;

    let mut names = Vec::with_capacity(arr.len());
    for entry in arr {
        let name = entry
            .as_str()
            .ok_or_else(|| format!("{}.required entries must be strings", path))?;
        if names.iter().any(|n| n == name) {
            return Err(format!("{}.required lists '{}' twice", path, name));
        }
        names.push(name.to_string());
    }
    Ok(names)
}

fn expected_types(types: &[BsonType]) -> String {
    types
        .iter()
        .map(BsonType::as_str)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "$root"
    } else {
        path
    }
}

fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
