//! Rendering of entity descriptors into store validators
//!
//! The rendered `$jsonSchema` has the shape used by the database's creation
//! script: an `object` root with a title, the required list and one property
//! per declared field, plus the implicit `_id: objectId`.

use serde_json::{json, Map, Value};

use super::types::{EntitySchema, FieldSpec};
use crate::document::{BsonType, ID_FIELD};
use crate::store::Validator;

/// `$jsonSchema` body of an entity.
pub fn json_schema(entity: &EntitySchema) -> Value {
    let mut properties = Map::new();
    properties.insert(
        ID_FIELD.to_string(),
        json!({ "bsonType": BsonType::ObjectId.as_str() }),
    );
    for field in entity.fields {
        properties.insert(field.name.to_string(), property(field));
    }

    let required: Vec<&str> = entity.required_fields().map(|f| f.name).collect();

    json!({
        "bsonType": BsonType::Object.as_str(),
        "title": entity.title,
        "required": required,
        "properties": properties,
    })
}

/// Strict, rejecting validator of an entity.
pub fn validator(entity: &EntitySchema) -> Validator {
    Validator::strict(json_schema(entity))
}

fn property(field: &FieldSpec) -> Value {
    let mut prop = Map::new();
    prop.insert("bsonType".into(), json!(field.bson_type.as_str()));
    if let Some(minimum) = field.minimum {
        prop.insert("minimum".into(), json!(minimum));
    }
    if let Some(items) = field.items {
        prop.insert("items".into(), json!({ "bsonType": items.as_str() }));
    }
    if let Some(description) = field.description {
        prop.insert("description".into(), json!(description));
    }
    Value::Object(prop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::{CLIENTES, RESERVAS, TIPOS_HABITACION};
    use crate::store::{ValidationAction, ValidationLevel};

    #[test]
    fn test_schema_shape() {
        let schema = json_schema(&RESERVAS);
        assert_eq!(schema["bsonType"], "object");
        assert_eq!(schema["title"], "Validador de la Colección Reservas");
        assert_eq!(schema["required"].as_array().unwrap().len(), 10);
        assert_eq!(schema["properties"]["_id"], json!({"bsonType": "objectId"}));
        assert_eq!(
            schema["properties"]["noches_estadia"],
            json!({"bsonType": "int", "minimum": 1, "description": "Requerido"})
        );
        assert_eq!(
            schema["properties"]["canal_reserva"],
            json!({"bsonType": "string"})
        );
    }

    #[test]
    fn test_array_items() {
        let schema = json_schema(&CLIENTES);
        assert_eq!(
            schema["properties"]["historial_ids_reservas"],
            json!({"bsonType": "array", "items": {"bsonType": "objectId"}})
        );
        let rooms = json_schema(&TIPOS_HABITACION);
        assert_eq!(
            rooms["properties"]["fotos_urls"]["items"],
            json!({"bsonType": "string"})
        );
    }

    #[test]
    fn test_validator_is_strict() {
        let v = validator(&CLIENTES);
        assert_eq!(v.validation_level, ValidationLevel::Strict);
        assert_eq!(v.validation_action, ValidationAction::Error);
        assert_eq!(v.json_schema(), Some(&json_schema(&CLIENTES)));
    }
}
