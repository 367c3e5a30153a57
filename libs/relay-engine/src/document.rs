use relay_api::dispatch::DocumentParser;
use relay_api::error::RelayError;
use relay_api::value::{Float, RecordBuilder, Value};

/// JSON parser for documents embedded in text values.
///
/// Object member order is kept (`serde_json` with `preserve_order`).
/// `null` becomes `Extant`; integers that fit `i64` become `Int`, every
/// other number `Float`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDocumentParser;

impl DocumentParser for JsonDocumentParser {
    fn parse(&self, text: &str) -> Result<Value, RelayError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(json_to_value(&json))
    }
}

pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Extant,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(Float::Double(n.as_f64().unwrap_or(f64::NAN))),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => {
            let mut record = RecordBuilder::with_capacity(items.len());
            for item in items {
                record.push(json_to_value(item));
            }
            Value::Record(record.finish())
        }
        serde_json::Value::Object(map) => {
            let mut record = RecordBuilder::with_capacity(map.len());
            for (k, v) in map {
                record.update_slot(k.as_str(), json_to_value(v));
            }
            Value::Record(record.finish())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_api::error::ErrorKind;

    #[test]
    fn parses_objects_in_member_order() {
        let v = JsonDocumentParser.parse(r#"{"k":"v","n":1,"a":[true,null,2.5]}"#).unwrap();
        let expected = RecordBuilder::new()
            .slot("k", "v")
            .slot("n", 1)
            .slot(
                "a",
                RecordBuilder::new().item(true).item(Value::Extant).item(2.5).finish(),
            )
            .finish();
        assert_eq!(v, Value::Record(expected));
    }

    #[test]
    fn plain_words_are_not_documents() {
        let err = JsonDocumentParser.parse("a").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
    }

    #[test]
    fn scalars_are_documents() {
        assert_eq!(JsonDocumentParser.parse("42").unwrap(), Value::Int(42));
        assert_eq!(JsonDocumentParser.parse("\"a\"").unwrap(), Value::from("a"));
        assert_eq!(
            JsonDocumentParser.parse("18446744073709551615").unwrap(),
            Value::from(18446744073709551615u64 as f64)
        );
        assert!(JsonDocumentParser.parse(r#"{"k":"#).is_err());
    }
}
