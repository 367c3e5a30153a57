//! Record key/value conversion into `Value` trees.
//!
//! Typed input (schema present and the object is a struct) goes through
//! [`typed`]; everything else through [`schemaless`].

pub mod schemaless;
pub mod typed;

use std::fmt;

use relay_api::dispatch::DocumentParser;
use relay_api::error::RelayError;
use relay_api::record::{HostValue, SinkRecord};
use relay_api::schema::Schema;
use relay_api::value::Value;

use crate::document::JsonDocumentParser;

/// Converter owned by one task. Holds the parser used for documents
/// embedded in untyped text.
pub struct MessageConverter {
    parser: Box<dyn DocumentParser>,
}

impl Default for MessageConverter {
    fn default() -> Self {
        Self::with_parser(Box::new(JsonDocumentParser))
    }
}

impl fmt::Debug for MessageConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageConverter").finish_non_exhaustive()
    }
}

impl MessageConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(parser: Box<dyn DocumentParser>) -> Self {
        Self { parser }
    }

    pub fn to_value(&self, object: &HostValue, schema: Option<&Schema>) -> Result<Value, RelayError> {
        match (schema, object) {
            (Some(schema), HostValue::Struct(s)) => {
                Ok(Value::Record(typed::convert_struct(s, schema)?))
            }
            _ => Ok(schemaless::convert(object, self.parser.as_ref())),
        }
    }

    pub fn convert_key(&self, record: &SinkRecord) -> Result<Value, RelayError> {
        self.to_value(&record.key, record.key_schema.as_ref())
            .map_err(|e| e.with_context("key"))
    }

    pub fn convert_value(&self, record: &SinkRecord) -> Result<Value, RelayError> {
        self.to_value(&record.value, record.value_schema.as_ref())
            .map_err(|e| e.with_context("value"))
    }
}
