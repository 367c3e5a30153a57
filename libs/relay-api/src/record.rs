use crate::error::RelayError;
use crate::schema::Schema;

/// Raw value as handed over by the streaming host.
///
/// The variants are the host's runtime shapes: primitives and binary,
/// ordered collections (`Array`), key/value mappings (`Map`, keys of any
/// shape, insertion ordered) and typed structs.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<HostValue>),
    Map(Vec<(HostValue, HostValue)>),
    Struct(Struct),
}

impl HostValue {
    /// Short shape name for error messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Int8(_) => "int8",
            HostValue::Int16(_) => "int16",
            HostValue::Int32(_) => "int32",
            HostValue::Int64(_) => "int64",
            HostValue::Float32(_) => "float32",
            HostValue::Float64(_) => "float64",
            HostValue::String(_) => "string",
            HostValue::Bytes(_) => "bytes",
            HostValue::Array(_) => "array",
            HostValue::Map(_) => "map",
            HostValue::Struct(_) => "struct",
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Int32(i)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int64(i)
    }
}

impl From<f32> for HostValue {
    fn from(v: f32) -> Self {
        HostValue::Float32(v)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::Float64(v)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(b: Vec<u8>) -> Self {
        HostValue::Bytes(b)
    }
}

impl From<Struct> for HostValue {
    fn from(s: Struct) -> Self {
        HostValue::Struct(s)
    }
}

/// Typed struct value. Field values are looked up by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Struct {
    fields: Vec<(String, HostValue)>,
}

impl Struct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing value of the same name.
    pub fn put(mut self, name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter().position(|(n, _)| *n == name) {
            Some(index) => self.fields[index].1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Value of a declared field. A field that was never set is an error.
    pub fn get(&self, name: &str) -> Result<&HostValue, RelayError> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| RelayError::conversion(format!("struct has no field '{name}'")))
    }

    pub fn fields(&self) -> &[(String, HostValue)] {
        &self.fields
    }
}

/// One inbound record: key and value, each with an optional schema.
///
/// Topic, partition and offset metadata stay with the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRecord {
    pub key: HostValue,
    pub key_schema: Option<Schema>,
    pub value: HostValue,
    pub value_schema: Option<Schema>,
}

impl SinkRecord {
    pub fn new(
        key: HostValue,
        key_schema: Option<Schema>,
        value: HostValue,
        value_schema: Option<Schema>,
    ) -> Self {
        Self { key, key_schema, value, value_schema }
    }

    /// Record with neither key nor value schema.
    pub fn schemaless(key: HostValue, value: HostValue) -> Self {
        Self::new(key, None, value, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn struct_put_replaces_by_name() {
        let s = Struct::new().put("a", 1).put("b", "x").put("a", 2);
        assert_eq!(s.fields().len(), 2);
        assert_eq!(s.get("a").unwrap(), &HostValue::Int32(2));
    }

    #[test]
    fn struct_missing_field_is_conversion_error() {
        let err = Struct::new().put("a", 1).get("b").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
    }
}
