//! Conversion of untyped records, dispatched on the host value's shape.

use relay_api::dispatch::DocumentParser;
use relay_api::error::ErrorKind;
use relay_api::record::HostValue;
use relay_api::value::{RecordBuilder, Value};

/// Convert an untyped host value. Never fails.
///
/// - Collections become records of their converted elements.
/// - Mappings become records of slots; only text keys are kept.
/// - Text is parsed as an embedded document; if that fails it stays text.
/// - Primitives and binary are wrapped as leaves.
pub fn convert(value: &HostValue, parser: &dyn DocumentParser) -> Value {
    match value {
        HostValue::Array(elements) => {
            let mut record = RecordBuilder::with_capacity(elements.len());
            for element in elements {
                record.push(convert(element, parser));
            }
            Value::Record(record.finish())
        }
        HostValue::Map(entries) => {
            let mut record = RecordBuilder::with_capacity(entries.len());
            for (key, value) in entries {
                if let HostValue::String(key) = key {
                    record.update_slot(key.as_str(), convert(value, parser));
                }
            }
            Value::Record(record.finish())
        }
        HostValue::Struct(s) => {
            let mut record = RecordBuilder::with_capacity(s.fields().len());
            for (name, value) in s.fields() {
                record.update_slot(name.as_str(), convert(value, parser));
            }
            Value::Record(record.finish())
        }
        HostValue::String(text) => match parser.parse(text) {
            Ok(document) => document,
            Err(e) if e.kind == ErrorKind::Format => {
                tracing::trace!(error = %e, "text is not a document, keeping it as text");
                Value::Text(text.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, "document parser failed, keeping text as is");
                Value::Text(text.clone())
            }
        },
        HostValue::Null
        | HostValue::Boolean(_)
        | HostValue::Int8(_)
        | HostValue::Int16(_)
        | HostValue::Int32(_)
        | HostValue::Int64(_)
        | HostValue::Float32(_)
        | HostValue::Float64(_)
        | HostValue::Bytes(_) => Value::from_primitive(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonDocumentParser;
    use relay_api::error::RelayError;
    use relay_api::record::Struct;
    use relay_api::value::Record;

    fn conv(value: HostValue) -> Value {
        convert(&value, &JsonDocumentParser)
    }

    #[test]
    fn non_text_keys_are_dropped() {
        let value = HostValue::Map(vec![
            (HostValue::from("a"), HostValue::Int32(1)),
            (HostValue::Int32(7), HostValue::Int32(2)),
            (HostValue::Bytes(b"k".to_vec()), HostValue::Int32(3)),
            (HostValue::from("b"), HostValue::Int32(4)),
        ]);
        let expected = Record::builder().slot("a", 1).slot("b", 4).finish();
        assert_eq!(conv(value), Value::Record(expected));
    }

    #[test]
    fn text_falls_back_when_not_a_document() {
        assert_eq!(conv(HostValue::from("a")), Value::from("a"));
        assert_eq!(conv(HostValue::from("{not json")), Value::from("{not json"));
        assert_eq!(conv(HostValue::from("")), Value::from(""));
    }

    struct Failing(ErrorKind);

    impl DocumentParser for Failing {
        fn parse(&self, _text: &str) -> Result<Value, RelayError> {
            Err(RelayError { kind: self.0, message: "unavailable".into() })
        }
    }

    #[test]
    fn text_is_kept_whatever_the_parser_error() {
        for kind in [ErrorKind::Format, ErrorKind::Conversion, ErrorKind::Dispatch] {
            let value = HostValue::Array(vec![HostValue::from("{\"a\":1}"), HostValue::Int32(2)]);
            let expected = Record::builder().item("{\"a\":1}").item(2).finish();
            assert_eq!(convert(&value, &Failing(kind)), Value::Record(expected));
        }
    }

    #[test]
    fn nested_text_is_parsed_too() {
        let value = HostValue::Array(vec![HostValue::from("[1,2]"), HostValue::from("x")]);
        let expected = Record::builder()
            .item(Record::builder().item(1).item(2).finish())
            .item("x")
            .finish();
        assert_eq!(conv(value), Value::Record(expected));
    }

    #[test]
    fn untyped_struct_is_a_mapping() {
        let value = HostValue::Struct(Struct::new().put("id", "u1").put("n", 3));
        let expected = Record::builder().slot("id", "u1").slot("n", 3).finish();
        assert_eq!(conv(value), Value::Record(expected));
    }

    #[test]
    fn null_is_extant() {
        assert_eq!(conv(HostValue::Null), Value::Extant);
    }
}
