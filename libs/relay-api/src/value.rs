use std::fmt;

use base64::Engine;
use serde::ser::{SerializeMap, SerializeSeq};

use crate::record::HostValue;

/// Generic structured value. Every converted key and payload is expressed
/// in this tree.
///
/// - `Absent`: no value present. Distinct from an explicit null.
/// - `Extant`: present but empty (host null, JSON `null`).
/// - Leaves: `Text`, `Int`, `Float`, `Bool`, `Binary`.
/// - `Record`: ordered sequence of bare values and key/value slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Absent,
    Extant,
    Text(String),
    Int(i64),
    Float(Float),
    Bool(bool),
    Binary(Vec<u8>),
    Record(Record),
}

/// Floating point leaf. Keeps the width the host value had.
///
/// Equality is numeric: `Single(2.0) == Double(2.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Float {
    Single(f32),
    Double(f64),
}

impl Float {
    pub fn as_f64(self) -> f64 {
        match self {
            Float::Single(v) => f64::from(v),
            Float::Double(v) => v,
        }
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.as_f64() == other.as_f64()
    }
}

/// Integral values keep a trailing `.0`, so `1.0` and `1` render apart.
impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integral = match *self {
            Float::Single(v) => {
                write!(f, "{v}")?;
                v.is_finite() && v.fract() == 0.0
            }
            Float::Double(v) => {
                write!(f, "{v}")?;
                v.is_finite() && v.fract() == 0.0
            }
        };
        if integral {
            f.write_str(".0")?;
        }
        Ok(())
    }
}

impl Value {
    /// Wrap a primitive or binary host value as a leaf.
    ///
    /// Host null becomes `Extant`. Integers of every width become `Int`,
    /// 32-bit floats stay `Float::Single`. Returns `None` for collections,
    /// mappings and structs, which are not primitives.
    pub fn from_primitive(host: &HostValue) -> Option<Value> {
        let value = match host {
            HostValue::Null => Value::Extant,
            HostValue::Boolean(b) => Value::Bool(*b),
            HostValue::Int8(i) => Value::Int(i64::from(*i)),
            HostValue::Int16(i) => Value::Int(i64::from(*i)),
            HostValue::Int32(i) => Value::Int(i64::from(*i)),
            HostValue::Int64(i) => Value::Int(*i),
            HostValue::Float32(v) => Value::Float(Float::Single(*v)),
            HostValue::Float64(v) => Value::Float(Float::Double(*v)),
            HostValue::String(s) => Value::Text(s.clone()),
            HostValue::Bytes(b) => Value::Binary(b.clone()),
            HostValue::Array(_) | HostValue::Map(_) | HostValue::Struct(_) => return None,
        };
        Some(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Textual rendering used for identifiers.
    ///
    /// Only leaves with an unambiguous text form render; `Absent`, `Extant`,
    /// `Binary` and `Record` return `None`.
    pub fn render_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Absent | Value::Extant | Value::Binary(_) | Value::Record(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(Float::Single(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(Float::Double(v))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Record
// ═══════════════════════════════════════════════════════════════

/// One entry of a `Record`.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Value),
    Slot(Value, Value),
}

impl Item {
    pub fn key(&self) -> Option<&Value> {
        match self {
            Item::Slot(k, _) => Some(k),
            Item::Value(_) => None,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Item::Slot(_, v) | Item::Value(v) => v,
        }
    }
}

/// Ordered sequence of items. Item order is insertion order.
///
/// Records are immutable once built; construction goes through
/// `RecordBuilder`, which owns the items until `finish()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    items: Vec<Item>,
}

impl Record {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RecordBuilder {
        RecordBuilder::new()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Value of the first slot whose key is `Text` equal to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.items.iter().find_map(|item| match item {
            Item::Slot(Value::Text(k), v) if k == name => Some(v),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Exclusive builder for a `Record` under construction.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    items: Vec<Item>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { items: Vec::with_capacity(capacity) }
    }

    /// Append a bare value at the tail.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(Item::Value(value.into()));
    }

    /// Replace the value of the first slot with an equal key, or append a new slot.
    pub fn update_slot(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.items.iter().position(|item| item.key() == Some(&key)) {
            Some(index) => self.items[index] = Item::Slot(key, value),
            None => self.items.push(Item::Slot(key, value)),
        }
    }

    /// Chaining form of `update_slot`.
    pub fn slot(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.update_slot(key, value);
        self
    }

    /// Chaining form of `push`.
    pub fn item(mut self, value: impl Into<Value>) -> Self {
        self.push(value);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn finish(self) -> Record {
        Record { items: self.items }
    }
}

// ═══════════════════════════════════════════════════════════════
//  JSON rendering of payloads
// ═══════════════════════════════════════════════════════════════

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Absent | Value::Extant => serializer.serialize_unit(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(Float::Single(v)) => serializer.serialize_f32(*v),
            Value::Float(Float::Double(v)) => serializer.serialize_f64(*v),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Binary(b) => {
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Record(r) => r.serialize(serializer),
        }
    }
}

impl serde::Serialize for Record {
    /// Records holding only text-keyed slots render as a JSON object,
    /// everything else as an array.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let object_like = !self.is_empty()
            && self
                .items
                .iter()
                .all(|item| matches!(item, Item::Slot(Value::Text(_), _)));

        if object_like {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for item in &self.items {
                if let Item::Slot(Value::Text(k), v) = item {
                    map.serialize_entry(k, v)?;
                }
            }
            map.end()
        } else {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for item in &self.items {
                seq.serialize_element(item)?;
            }
            seq.end()
        }
    }
}

impl serde::Serialize for Item {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Item::Value(v) => v.serialize(serializer),
            Item::Slot(Value::Text(k), v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(k, v)?;
                map.end()
            }
            Item::Slot(k, v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("@slot", &(k, v))?;
                map.end()
            }
        }
    }
}
