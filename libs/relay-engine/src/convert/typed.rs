//! Schema-directed conversion of typed records.

use relay_api::error::RelayError;
use relay_api::record::{HostValue, Struct};
use relay_api::schema::{Schema, SchemaKind};
use relay_api::value::{Record, RecordBuilder, Value};

/// Convert a struct field by field, in the schema's declaration order.
pub fn convert_struct(value: &Struct, schema: &Schema) -> Result<Record, RelayError> {
    let fields = schema.fields().ok_or_else(|| {
        RelayError::conversion(format!(
            "expected a struct schema, got '{}'",
            schema.kind.type_name()
        ))
    })?;

    let mut record = RecordBuilder::with_capacity(fields.len());
    for field in fields {
        let raw = value.get(&field.name)?;
        let converted = convert_field(&field.schema, raw)
            .map_err(|e| e.with_context(format!("field '{}'", field.name)))?;
        record.update_slot(field.name.as_str(), converted);
    }
    Ok(record.finish())
}

/// Convert one value according to its declared schema.
///
/// Primitive kinds wrap the raw value as-is. Kinds the converter does not
/// understand yield `Absent`.
pub fn convert_field(schema: &Schema, value: &HostValue) -> Result<Value, RelayError> {
    if schema.kind.is_primitive() {
        return Value::from_primitive(value).ok_or_else(|| mismatch(schema, value));
    }

    match (&schema.kind, value) {
        (SchemaKind::Other(_), _) => Ok(Value::Absent),
        (_, HostValue::Null) if schema.optional => Ok(Value::Extant),
        (SchemaKind::Struct(_), HostValue::Struct(s)) => Ok(Value::Record(convert_struct(s, schema)?)),
        (SchemaKind::Array(items), HostValue::Array(elements)) => {
            Ok(Value::Record(convert_array(items, elements)?))
        }
        (SchemaKind::Map(keys, values), HostValue::Map(entries)) => {
            Ok(Value::Record(convert_map(keys, values, entries)?))
        }
        _ => Err(mismatch(schema, value)),
    }
}

/// Elements whose item kind is not understood are skipped.
fn convert_array(items: &Schema, elements: &[HostValue]) -> Result<Record, RelayError> {
    let mut record = RecordBuilder::with_capacity(elements.len());
    if matches!(items.kind, SchemaKind::Other(_)) {
        return Ok(record.finish());
    }
    for (i, element) in elements.iter().enumerate() {
        let converted =
            convert_field(items, element).map_err(|e| e.with_context(format!("element {i}")))?;
        record.push(converted);
    }
    Ok(record.finish())
}

/// Keys take whatever form the key schema dictates; they need not be text.
fn convert_map(
    keys: &Schema,
    values: &Schema,
    entries: &[(HostValue, HostValue)],
) -> Result<Record, RelayError> {
    let mut record = RecordBuilder::with_capacity(entries.len());
    for (k, v) in entries {
        let key = convert_field(keys, k).map_err(|e| e.with_context("map key"))?;
        let value = convert_field(values, v).map_err(|e| e.with_context("map value"))?;
        record.update_slot(key, value);
    }
    Ok(record.finish())
}

fn mismatch(schema: &Schema, value: &HostValue) -> RelayError {
    RelayError::conversion(format!(
        "schema '{}' does not match {} value",
        schema.kind.type_name(),
        value.shape_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_api::error::ErrorKind;
    use relay_api::value::Float;

    #[test]
    fn primitive_fields_wrap_directly() {
        assert_eq!(
            convert_field(&Schema::float32(), &HostValue::Float32(2.5)).unwrap(),
            Value::Float(Float::Single(2.5))
        );
        // Typed text is never parsed as a document.
        assert_eq!(
            convert_field(&Schema::string(), &HostValue::from("{\"k\":1}")).unwrap(),
            Value::from("{\"k\":1}")
        );
        assert_eq!(convert_field(&Schema::int64(), &HostValue::Null).unwrap(), Value::Extant);
    }

    #[test]
    fn unknown_kinds_yield_absent() {
        let schema = Schema::new(SchemaKind::Other("decimal".into()));
        assert_eq!(convert_field(&schema, &HostValue::Bytes(vec![1])).unwrap(), Value::Absent);
    }

    #[test]
    fn array_of_unknown_items_is_empty() {
        let schema = Schema::array(Schema::new(SchemaKind::Other("decimal".into())));
        let value = HostValue::Array(vec![HostValue::Int32(1), HostValue::Int32(2)]);
        assert_eq!(convert_field(&schema, &value).unwrap(), Value::Record(Record::empty()));
    }

    #[test]
    fn map_keys_follow_key_schema() {
        let schema = Schema::map(Schema::int32(), Schema::string());
        let value = HostValue::Map(vec![
            (HostValue::Int32(1), HostValue::from("x")),
            (HostValue::Int32(2), HostValue::from("y")),
        ]);
        let expected = RecordBuilder::new().slot(1, "x").slot(2, "y").finish();
        assert_eq!(convert_field(&schema, &value).unwrap(), Value::Record(expected));
    }

    #[test]
    fn null_composites_depend_on_optionality() {
        let inner = Schema::structure().field("a", Schema::int32());
        assert_eq!(
            convert_field(&inner.clone().optional(), &HostValue::Null).unwrap(),
            Value::Extant
        );
        let err = convert_field(&inner, &HostValue::Null).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
    }

    #[test]
    fn shape_mismatch_is_conversion_error() {
        let schema = Schema::array(Schema::string());
        let err = convert_field(&schema, &HostValue::from("x")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(err.message, "schema 'array' does not match string value");

        let err = convert_field(&Schema::string(), &HostValue::Array(vec![])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
    }

    #[test]
    fn missing_declared_field_fails_with_path() {
        let schema = Schema::structure()
            .field("a", Schema::int32())
            .field("b", Schema::structure().field("c", Schema::string()));
        let value = Struct::new().put("a", 1).put("b", Struct::new());
        let err = convert_struct(&value, &schema).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(err.message, "field 'b': struct has no field 'c'");
    }

    #[test]
    fn struct_requires_struct_schema() {
        let err = convert_struct(&Struct::new(), &Schema::string()).unwrap_err();
        assert_eq!(err.message, "expected a struct schema, got 'string'");
    }
}
