//! Mapping between annotations and store objects.
//!
//! An annotation is stored as one object of class [`ANNOTATION_CLASS`] whose
//! single property [`JSON_PROPERTY`] holds the flat JSON form of the record.

use std::collections::BTreeMap;

use marg_store::StoreObject;
use marg_types::timestamp;
use serde_json::{Map, Value};

use crate::annotation::Annotation;
use crate::error::{AnnotationError, AnnotationResult};

pub const ANNOTATION_CLASS: &str = "annotation";
pub const JSON_PROPERTY: &str = "json";

/// Serialize an annotation into the property set of its store object.
pub fn encode(annotation: &Annotation) -> AnnotationResult<BTreeMap<String, String>> {
    let text = serde_json::to_string(&annotation.to_json())
        .map_err(|e| AnnotationError::Serialization(e.to_string()))?;
    Ok(BTreeMap::from([(JSON_PROPERTY.to_string(), text)]))
}

/// Parse a store object back into an annotation.
///
/// Any structural problem is a [`AnnotationError::CorruptRecord`]; records
/// are never silently skipped.
pub fn decode(object: &StoreObject) -> AnnotationResult<Annotation> {
    let corrupt = |reason: String| AnnotationError::CorruptRecord {
        object: object.id,
        reason,
    };

    let text = object
        .property(JSON_PROPERTY)
        .ok_or_else(|| corrupt(format!("missing `{JSON_PROPERTY}` property")))?;
    let mut map: Map<String, Value> = match serde_json::from_str(text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => return Err(corrupt(format!("expected a JSON object, found {}", kind(&other)))),
        Err(e) => return Err(corrupt(format!("malformed JSON: {e}"))),
    };

    let id = match map.remove("id") {
        Some(Value::String(id)) => id,
        Some(_) => return Err(corrupt("`id` is not a string".into())),
        None => return Err(corrupt("missing `id`".into())),
    };
    let mut instant = |key: &str| {
        let raw = map
            .remove(key)
            .ok_or_else(|| corrupt(format!("missing `{key}`")))?;
        let raw = raw
            .as_str()
            .ok_or_else(|| corrupt(format!("`{key}` is not a string")))?;
        timestamp::parse(raw).map_err(|e| corrupt(e.to_string()))
    };
    let created = instant("created")?;
    let updated = instant("updated")?;

    Ok(Annotation {
        id,
        created,
        updated,
        fields: map,
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use marg_types::ObjectId;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::annotation::Fields;

    fn object_with(json: &str) -> StoreObject {
        StoreObject::new(ObjectId::new(), ANNOTATION_CLASS).with_property(JSON_PROPERTY, json)
    }

    fn assert_corrupt(object: &StoreObject, needle: &str) {
        match decode(object) {
            Err(AnnotationError::CorruptRecord { object: id, reason }) => {
                assert_eq!(id, object.id);
                assert!(reason.contains(needle), "reason {reason:?} lacks {needle:?}");
            }
            other => panic!("expected CorruptRecord, got {other:?}"),
        }
    }

    #[test]
    fn encode_writes_single_json_property() {
        let a = Annotation::create(Fields::new(), timestamp::now());
        let props = encode(&a).unwrap();
        assert_eq!(props.len(), 1);
        let stored: Value = serde_json::from_str(&props[JSON_PROPERTY]).unwrap();
        assert_eq!(stored["id"], json!(a.id));
    }

    #[test]
    fn decode_reverses_encode() {
        let mut fields = Fields::new();
        fields.insert("uri".into(), json!("http://example.com"));
        fields.insert("ranges".into(), json!([{"start": "/p[1]", "startOffset": 0}]));
        fields.insert("tags".into(), json!(null));
        let a = Annotation::create(fields, timestamp::now());
        let mut object = StoreObject::new(ObjectId::new(), ANNOTATION_CLASS);
        object.properties = encode(&a).unwrap();
        assert_eq!(decode(&object).unwrap(), a);
    }

    #[test]
    fn big_numbers_survive_storage() {
        let parsed: Value =
            serde_json::from_str(r#"{"n": 123456789012345678901234567890, "d": 0.1000000000000000000000001}"#).unwrap();
        let Value::Object(fields) = parsed else { panic!("expected object") };
        let a = Annotation::create(fields, timestamp::now());
        let mut object = StoreObject::new(ObjectId::new(), ANNOTATION_CLASS);
        object.properties = encode(&a).unwrap();
        let back = decode(&object).unwrap();
        assert_eq!(back.fields["n"].to_string(), "123456789012345678901234567890");
        assert_eq!(back.fields["d"].to_string(), "0.1000000000000000000000001");
    }

    #[test]
    fn missing_property_is_corrupt() {
        assert_corrupt(&StoreObject::new(ObjectId::new(), ANNOTATION_CLASS), "missing `json`");
    }

    #[test]
    fn malformed_json_is_corrupt() {
        assert_corrupt(&object_with("{not json"), "malformed JSON");
    }

    #[test]
    fn non_object_is_corrupt() {
        assert_corrupt(&object_with("[1, 2]"), "an array");
    }

    #[test]
    fn bad_id_is_corrupt() {
        let ts = "2026-01-01T00:00:00.000000Z";
        assert_corrupt(
            &object_with(&json!({"created": ts, "updated": ts}).to_string()),
            "missing `id`",
        );
        assert_corrupt(
            &object_with(&json!({"id": 7, "created": ts, "updated": ts}).to_string()),
            "`id` is not a string",
        );
    }

    #[test]
    fn bad_timestamp_is_corrupt() {
        let good = "2026-01-01T00:00:00.000000Z";
        assert_corrupt(
            &object_with(&json!({"id": "a", "created": "yesterday", "updated": good}).to_string()),
            "yesterday",
        );
        assert_corrupt(&object_with(&json!({"id": "a", "created": good}).to_string()), "missing `updated`");
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[ -~]{0,24}".prop_map(Value::from),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn arbitrary_fields_survive_storage(
            fields in prop::collection::btree_map("[a-zA-Z_]{1,10}", value(), 0..8)
        ) {
            let a = Annotation::create(fields.into_iter().collect(), timestamp::now());
            let mut object = StoreObject::new(ObjectId::new(), ANNOTATION_CLASS);
            object.properties = encode(&a).unwrap();
            prop_assert_eq!(decode(&object).unwrap(), a);
        }
    }
}
