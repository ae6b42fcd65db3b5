//! Data model of the CostaDelInka database
//!
//! A static table of entity descriptors is the single source of truth:
//! validators and index definitions are both derived from it.
//!
//! - `types`: descriptor types (`EntitySchema`, `FieldSpec`, `IndexSpec`)
//! - `catalog`: the eight entities
//! - `json_schema`: rendering into `$jsonSchema` validators

pub mod catalog;
mod json_schema;
mod types;

pub use catalog::{entities, entity, ENTITIES};
pub use json_schema::{json_schema, validator};
pub use types::{EntityKind, EntitySchema, FieldSpec, IndexSpec};
