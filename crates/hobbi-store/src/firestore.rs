//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore's REST surface wraps every value in a single-key object naming
//! its type (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Integers
//! travel as strings; empty arrays and maps may omit their inner field.

use serde_json::{json, Map, Value};

/// Encode a JSON object as a Firestore `fields` map.
pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Encode one JSON value as a Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode a Firestore `fields` map into a JSON object.
pub fn decode_fields(fields: &Value) -> Result<Map<String, Value>, String> {
    let Some(map) = fields.as_object() else {
        return Err("fields is not an object".to_string());
    };

    map.iter()
        .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

/// Decode one Firestore typed value.
pub fn decode_value(value: &Value) -> Result<Value, String> {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(format!("expected a typed value, got {}", value));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("booleanValue is not a bool: {}", inner)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| format!("integerValue is not an integer: {}", inner))
        }
        "doubleValue" => {
            let parsed = match inner {
                Value::Number(n) => n.as_f64(),
                // NaN and infinities arrive as strings
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .map(|f| serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number))
                .ok_or_else(|| format!("doubleValue is not a number: {}", inner))
        }
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("{} is not a string: {}", kind, inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values: &[Value] = match inner.get("values") {
                Some(Value::Array(values)) => values.as_slice(),
                Some(other) => return Err(format!("arrayValue.values is not an array: {}", other)),
                None => &[],
            };
            values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(format!("unsupported value type '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_travel_as_strings() {
        assert_eq!(encode_value(&json!(1700000000000_i64)), json!({ "integerValue": "1700000000000" }));
        assert_eq!(decode_value(&json!({ "integerValue": "42" })).unwrap(), json!(42));
    }

    #[test]
    fn test_decode_nested_document() {
        let fields = json!({
            "goals": { "arrayValue": { "values": [
                { "mapValue": { "fields": {
                    "id": { "integerValue": "1" },
                    "title": { "stringValue": "Read" },
                    "current": { "doubleValue": 2.5 },
                    "history": { "arrayValue": {} }
                }}}
            ]}},
            "lastUpdated": { "stringValue": "2026-10-17T08:00:00.000Z" },
            "meta": { "mapValue": {} }
        });

        let decoded = decode_fields(&fields).unwrap();
        assert_eq!(decoded["goals"][0]["id"], json!(1));
        assert_eq!(decoded["goals"][0]["current"], json!(2.5));
        assert_eq!(decoded["goals"][0]["history"], json!([]));
        assert_eq!(decoded["lastUpdated"], json!("2026-10-17T08:00:00.000Z"));
        assert_eq!(decoded["meta"], json!({}));
    }

    #[test]
    fn test_encoded_document_decodes_to_original() {
        let original = json!({
            "goals": [{ "id": 3, "title": "Save", "current": 7250.5, "notes": null, "done": false }],
            "favorites": [],
            "lastUpdated": "2026-10-17T08:00:00Z"
        });
        let Value::Object(map) = original.clone() else { unreachable!() };

        let decoded = decode_fields(&encode_fields(&map)).unwrap();
        assert_eq!(Value::Object(decoded), original);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(decode_value(&json!({ "vectorValue": [] })).is_err());
        assert!(decode_value(&json!("bare string")).is_err());
    }
}
