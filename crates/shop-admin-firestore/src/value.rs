//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type,
//! for example `{"integerValue": "12"}` or `{"mapValue": {"fields": {..}}}`.

use serde_json::{Map, Number, Value, json};

use shop_admin::Document;

/// Encode document fields for a write.
pub fn encode_fields(fields: &Document) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect()
}

/// Decode the `fields` object of a Firestore document.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Document, String> {
    fields
        .iter()
        .map(|(k, v)| decode(v).map(|v| (k.clone(), v)).map_err(|e| format!("{k}: {e}")))
        .collect()
}

pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(u)) => json!({ "integerValue": u.to_string() }),
            _ => json!({ "doubleValue": n }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn decode(value: &Value) -> Result<Value, String> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(format!("not a typed value: {value}"));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("bad booleanValue {inner}")),
        // Int64 travels as a decimal string.
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("bad integerValue {s:?}: {e}")),
            Value::Number(n) => Ok(Value::Number(n.clone())),
            other => Err(format!("bad integerValue {other}")),
        },
        "doubleValue" => match inner {
            Value::Number(n) => Ok(Value::Number(n.clone())),
            // NaN and the infinities arrive as strings and have no JSON form.
            Value::String(s) => Err(format!("unrepresentable doubleValue {s:?}")),
            other => Err(format!("bad doubleValue {other}")),
        },
        "timestampValue" | "stringValue" | "bytesValue" | "referenceValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| format!("bad {kind} {inner}")),
        "geoPointValue" => {
            let point = |axis: &str| {
                inner
                    .get(axis)
                    .and_then(Value::as_f64)
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::from(0))
            };
            Ok(json!({ "latitude": point("latitude"), "longitude": point("longitude") }))
        }
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(decode).collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(format!("unknown value type {other}")),
    }
}
