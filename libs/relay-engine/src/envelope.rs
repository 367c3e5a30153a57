//! Decoding of inbound records from JSON lines.
//!
//! A line is `{"key": K, "value": V}`; a missing part is null. Each part is
//! either a schema envelope `{"schema": S, "payload": P}` or any other JSON
//! value, which is taken as untyped.
//!
//! Schema vocabulary: `type` (`int8`..`int64`, `float32`, `float64`,
//! `boolean`, `string`, `bytes`, `struct`, `array`, `map`), `optional`,
//! `name`, `fields` (each with `field`), `items`, `keys`, `values`.
//! Typed bytes are base64 strings. Maps with text keys are objects, other
//! maps arrays of `[key, value]` pairs.

use base64::Engine;
use relay_api::record::{HostValue, SinkRecord, Struct};
use relay_api::schema::{Field, Schema, SchemaKind};
use serde_json::{Map, Value as Json};

use crate::error::EngineError;

pub fn decode_line(line: &str) -> Result<SinkRecord, EngineError> {
    let json: Json =
        serde_json::from_str(line).map_err(|e| EngineError::Envelope(e.to_string()))?;
    decode(&json)
}

pub fn decode(json: &Json) -> Result<SinkRecord, EngineError> {
    let Json::Object(obj) = json else {
        return Err(EngineError::Envelope("record must be an object".into()));
    };
    let (key, key_schema) = decode_part(obj.get("key")).map_err(|e| e.with_context("key"))?;
    let (value, value_schema) =
        decode_part(obj.get("value")).map_err(|e| e.with_context("value"))?;
    Ok(SinkRecord::new(key, key_schema, value, value_schema))
}

fn decode_part(part: Option<&Json>) -> Result<(HostValue, Option<Schema>), EngineError> {
    let Some(part) = part else {
        return Ok((HostValue::Null, None));
    };
    match as_envelope(part) {
        Some((Json::Null, payload)) => Ok((untyped(payload), None)),
        Some((schema, payload)) => {
            let schema = parse_schema(schema).map_err(|e| e.with_context("schema"))?;
            let value = typed(payload, &schema).map_err(|e| e.with_context("payload"))?;
            Ok((value, Some(schema)))
        }
        None => Ok((untyped(part), None)),
    }
}

fn as_envelope(part: &Json) -> Option<(&Json, &Json)> {
    match part {
        Json::Object(obj) if obj.len() == 2 => Some((obj.get("schema")?, obj.get("payload")?)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

pub fn parse_schema(json: &Json) -> Result<Schema, EngineError> {
    let Json::Object(obj) = json else {
        return Err(EngineError::Envelope("schema must be an object".into()));
    };
    let type_name = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| EngineError::Envelope("schema has no 'type'".into()))?;

    let kind = match type_name {
        "int8" => SchemaKind::Int8,
        "int16" => SchemaKind::Int16,
        "int32" => SchemaKind::Int32,
        "int64" => SchemaKind::Int64,
        "float32" => SchemaKind::Float32,
        "float64" => SchemaKind::Float64,
        "boolean" => SchemaKind::Boolean,
        "string" => SchemaKind::String,
        "bytes" => SchemaKind::Bytes,
        "struct" => SchemaKind::Struct(parse_fields(obj)?),
        "array" => SchemaKind::Array(Box::new(
            parse_schema(member(obj, "items")?).map_err(|e| e.with_context("items"))?,
        )),
        "map" => SchemaKind::Map(
            Box::new(parse_schema(member(obj, "keys")?).map_err(|e| e.with_context("keys"))?),
            Box::new(parse_schema(member(obj, "values")?).map_err(|e| e.with_context("values"))?),
        ),
        other => SchemaKind::Other(other.to_string()),
    };

    let mut schema = Schema::new(kind);
    if obj.get("optional").and_then(Json::as_bool).unwrap_or(false) {
        schema = schema.optional();
    }
    if let Some(name) = obj.get("name").and_then(Json::as_str) {
        schema = schema.named(name);
    }
    Ok(schema)
}

fn parse_fields(obj: &Map<String, Json>) -> Result<Vec<Field>, EngineError> {
    let Json::Array(fields) = member(obj, "fields")? else {
        return Err(EngineError::Envelope("'fields' must be an array".into()));
    };
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| -> Result<Field, EngineError> {
            let name = field
                .get("field")
                .and_then(Json::as_str)
                .ok_or_else(|| EngineError::Envelope(format!("field {i} has no name")))?;
            let schema = parse_schema(field).map_err(|e| e.with_context(format!("field '{name}'")))?;
            Ok(Field::new(name, schema))
        })
        .collect()
}

fn member<'a>(obj: &'a Map<String, Json>, name: &str) -> Result<&'a Json, EngineError> {
    obj.get(name)
        .ok_or_else(|| EngineError::Envelope(format!("schema has no '{name}'")))
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Host value of a typed payload. Null is kept as null for any schema.
pub fn typed(json: &Json, schema: &Schema) -> Result<HostValue, EngineError> {
    if json.is_null() {
        return Ok(HostValue::Null);
    }
    let value = match &schema.kind {
        SchemaKind::Int8 => HostValue::Int8(narrow(json, schema)?),
        SchemaKind::Int16 => HostValue::Int16(narrow(json, schema)?),
        SchemaKind::Int32 => HostValue::Int32(narrow(json, schema)?),
        SchemaKind::Int64 => HostValue::Int64(json.as_i64().ok_or_else(|| mismatch(json, schema))?),
        SchemaKind::Float32 => {
            HostValue::Float32(json.as_f64().ok_or_else(|| mismatch(json, schema))? as f32)
        }
        SchemaKind::Float64 => HostValue::Float64(json.as_f64().ok_or_else(|| mismatch(json, schema))?),
        SchemaKind::Boolean => HostValue::Boolean(json.as_bool().ok_or_else(|| mismatch(json, schema))?),
        SchemaKind::String => {
            HostValue::String(json.as_str().ok_or_else(|| mismatch(json, schema))?.to_string())
        }
        SchemaKind::Bytes => {
            let text = json.as_str().ok_or_else(|| mismatch(json, schema))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(text)
                .map_err(|e| EngineError::Envelope(format!("invalid base64: {e}")))?;
            HostValue::Bytes(bytes)
        }
        SchemaKind::Struct(fields) => {
            let Json::Object(obj) = json else {
                return Err(mismatch(json, schema));
            };
            let mut s = Struct::new();
            for field in fields {
                match obj.get(&field.name) {
                    Some(v) => {
                        let v = typed(v, &field.schema)
                            .map_err(|e| e.with_context(format!("field '{}'", field.name)))?;
                        s = s.put(field.name.as_str(), v);
                    }
                    None if field.schema.optional => s = s.put(field.name.as_str(), HostValue::Null),
                    None => {}
                }
            }
            HostValue::Struct(s)
        }
        SchemaKind::Array(items) => {
            let Json::Array(elements) = json else {
                return Err(mismatch(json, schema));
            };
            let elements = elements
                .iter()
                .enumerate()
                .map(|(i, e)| typed(e, items).map_err(|err| err.with_context(format!("element {i}"))))
                .collect::<Result<Vec<_>, _>>()?;
            HostValue::Array(elements)
        }
        SchemaKind::Map(keys, values) => HostValue::Map(typed_entries(json, schema, keys, values)?),
        SchemaKind::Other(_) => untyped(json),
    };
    Ok(value)
}

fn typed_entries(
    json: &Json,
    schema: &Schema,
    keys: &Schema,
    values: &Schema,
) -> Result<Vec<(HostValue, HostValue)>, EngineError> {
    match json {
        Json::Object(obj) if matches!(keys.kind, SchemaKind::String) => obj
            .iter()
            .map(|(k, v)| -> Result<_, EngineError> {
                Ok((HostValue::String(k.clone()), typed(v, values)?))
            })
            .collect(),
        Json::Array(pairs) => pairs
            .iter()
            .map(|pair| -> Result<_, EngineError> {
                match pair.as_array().map(Vec::as_slice) {
                    Some([k, v]) => Ok((typed(k, keys)?, typed(v, values)?)),
                    _ => Err(EngineError::Envelope("map entry must be a [key, value] pair".into())),
                }
            })
            .collect(),
        _ => Err(mismatch(json, schema)),
    }
}

fn narrow<T: TryFrom<i64>>(json: &Json, schema: &Schema) -> Result<T, EngineError> {
    json.as_i64()
        .and_then(|i| T::try_from(i).ok())
        .ok_or_else(|| mismatch(json, schema))
}

fn mismatch(json: &Json, schema: &Schema) -> EngineError {
    EngineError::Envelope(format!(
        "expected {}, got {}",
        schema.kind.type_name(),
        json_type(json)
    ))
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Host value of a payload without schema.
pub fn untyped(json: &Json) -> HostValue {
    match json {
        Json::Null => HostValue::Null,
        Json::Bool(b) => HostValue::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => HostValue::Int64(i),
            None => HostValue::Float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => HostValue::String(s.clone()),
        Json::Array(items) => HostValue::Array(items.iter().map(untyped).collect()),
        Json::Object(obj) => HostValue::Map(
            obj.iter()
                .map(|(k, v)| (HostValue::String(k.clone()), untyped(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_parts_are_untyped() {
        let record = decode_line(r#"{"key":"u1","value":{"n":1,"tags":["a"]}}"#).unwrap();
        assert_eq!(record.key, HostValue::from("u1"));
        assert_eq!(record.key_schema, None);
        assert_eq!(
            record.value,
            HostValue::Map(vec![
                (HostValue::from("n"), HostValue::Int64(1)),
                (HostValue::from("tags"), HostValue::Array(vec![HostValue::from("a")])),
            ])
        );
    }

    #[test]
    fn missing_parts_are_null() {
        let record = decode_line(r#"{"value":1}"#).unwrap();
        assert_eq!(record.key, HostValue::Null);
        assert_eq!(record.value, HostValue::Int64(1));
    }

    #[test]
    fn envelope_with_struct_schema() {
        let line = r#"{"value":{"schema":{"type":"struct","fields":[
            {"field":"id","type":"string"},
            {"field":"ratio","type":"float32"},
            {"field":"raw","type":"bytes"},
            {"field":"note","type":"string","optional":true}
        ]},"payload":{"id":"u1","ratio":0.5,"raw":"YWJj"}}}"#;
        let record = decode_line(line).unwrap();
        let schema = record.value_schema.unwrap();
        assert_eq!(schema.fields().map(<[Field]>::len), Some(4));
        assert_eq!(
            record.value,
            HostValue::Struct(
                Struct::new()
                    .put("id", "u1")
                    .put("ratio", 0.5f32)
                    .put("raw", b"abc".to_vec())
                    .put("note", HostValue::Null)
            )
        );
    }

    #[test]
    fn maps_with_non_text_keys_are_pairs() {
        let line = r#"{"key":{"schema":{"type":"map","keys":{"type":"int32"},"values":{"type":"string"}},
            "payload":[[1,"a"],[2,"b"]]}}"#;
        let record = decode_line(line).unwrap();
        assert_eq!(
            record.key,
            HostValue::Map(vec![
                (HostValue::Int32(1), HostValue::from("a")),
                (HostValue::Int32(2), HostValue::from("b")),
            ])
        );
    }

    #[test]
    fn unknown_types_are_kept_as_other() {
        let schema = parse_schema(&serde_json::json!({"type":"decimal"})).unwrap();
        assert_eq!(schema.kind, SchemaKind::Other("decimal".into()));
    }

    #[test]
    fn payload_mismatch_is_reported_with_path() {
        let line = r#"{"value":{"schema":{"type":"struct","fields":[{"field":"n","type":"int8"}]},
            "payload":{"n":300}}}"#;
        let err = decode_line(line).unwrap_err();
        assert_eq!(
            err.to_string(),
            "envelope error: value: payload: field 'n': expected int8, got number"
        );
    }

    #[test]
    fn malformed_lines_are_envelope_errors() {
        assert!(matches!(decode_line("{"), Err(EngineError::Envelope(_))));
        assert!(matches!(decode_line("[1]"), Err(EngineError::Envelope(_))));
    }
}
