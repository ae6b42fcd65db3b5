//! Document representation
//!
//! Documents are `serde_json::Value` objects. Types JSON cannot express
//! natively use MongoDB Extended JSON wrappers:
//!
//! - object id: `{"$oid": "507f1f77bcf86cd799439011"}`
//! - date: `{"$date": "2024-05-17T10:30:00.000Z"}` (RFC 3339) or
//!   `{"$date": 1715941800000}` (milliseconds since the epoch)

mod bson_type;
mod object_id;

pub use bson_type::BsonType;
pub use object_id::{ObjectId, ObjectIdError, OID_KEY};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};

/// Extended JSON key carrying a date.
pub const DATE_KEY: &str = "$date";

/// Name of the primary key field.
pub const ID_FIELD: &str = "_id";

/// Extended JSON form of a date.
pub fn date(at: DateTime<Utc>) -> Value {
    json!({ DATE_KEY: at.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

/// Extended JSON form of an object id.
pub fn oid(id: ObjectId) -> Value {
    id.to_json()
}

/// Reads a date from its Extended JSON form.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    match obj.get(DATE_KEY)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Returns the object id stored in a document's `_id`, if any.
pub fn document_id(document: &Value) -> Option<ObjectId> {
    document.get(ID_FIELD).and_then(ObjectId::from_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_roundtrip_millis_precision() {
        let at = Utc.with_ymd_and_hms(2015, 7, 1, 0, 0, 0).unwrap();
        let value = date(at);
        assert_eq!(value, json!({"$date": "2015-07-01T00:00:00.000Z"}));
        assert_eq!(parse_date(&value), Some(at));
    }

    #[test]
    fn test_date_from_epoch_millis() {
        let value = json!({"$date": 0});
        assert_eq!(parse_date(&value), Some(Utc.timestamp_opt(0, 0).unwrap()));
    }

    #[test]
    fn test_date_rejects_garbage() {
        assert_eq!(parse_date(&json!({"$date": "2015-13-45"})), None);
        assert_eq!(parse_date(&json!({"$date": true})), None);
        assert_eq!(parse_date(&json!("2015-07-01T00:00:00Z")), None);
    }

    #[test]
    fn test_document_id() {
        let id = ObjectId::new();
        let doc = json!({"_id": oid(id), "email": "a@b.pe"});
        assert_eq!(document_id(&doc), Some(id));
        assert_eq!(document_id(&json!({"_id": 5})), None);
    }
}
