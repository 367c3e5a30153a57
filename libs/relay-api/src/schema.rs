/// Declared kind of a typed key or value.
///
/// Primitive kinds mirror the host framework's primitive taxonomy.
/// `Other` carries kinds the converter does not understand (logical
/// or extension types); converting against it yields `Value::Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    String,
    Bytes,
    Struct(Vec<Field>),
    Array(Box<Schema>),
    Map(Box<Schema>, Box<Schema>),
    Other(std::string::String),
}

impl SchemaKind {
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            SchemaKind::Int8
                | SchemaKind::Int16
                | SchemaKind::Int32
                | SchemaKind::Int64
                | SchemaKind::Float32
                | SchemaKind::Float64
                | SchemaKind::Boolean
                | SchemaKind::String
                | SchemaKind::Bytes
        )
    }

    /// Type name in the host framework's vocabulary (`"int32"`, `"struct"`, ...).
    pub fn type_name(&self) -> &str {
        match self {
            SchemaKind::Int8 => "int8",
            SchemaKind::Int16 => "int16",
            SchemaKind::Int32 => "int32",
            SchemaKind::Int64 => "int64",
            SchemaKind::Float32 => "float32",
            SchemaKind::Float64 => "float64",
            SchemaKind::Boolean => "boolean",
            SchemaKind::String => "string",
            SchemaKind::Bytes => "bytes",
            SchemaKind::Struct(_) => "struct",
            SchemaKind::Array(_) => "array",
            SchemaKind::Map(_, _) => "map",
            SchemaKind::Other(name) => name,
        }
    }
}

/// A single named field of a struct schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: std::string::String,
    pub schema: Schema,
}

impl Field {
    pub fn new(name: impl Into<std::string::String>, schema: Schema) -> Self {
        Self { name: name.into(), schema }
    }
}

/// Type descriptor attached to a record key or value by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    /// Whether the host allows a null in this position.
    pub optional: bool,
    pub name: Option<std::string::String>,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self { kind, optional: false, name: None }
    }

    pub fn int8() -> Self {
        Self::new(SchemaKind::Int8)
    }

    pub fn int16() -> Self {
        Self::new(SchemaKind::Int16)
    }

    pub fn int32() -> Self {
        Self::new(SchemaKind::Int32)
    }

    pub fn int64() -> Self {
        Self::new(SchemaKind::Int64)
    }

    pub fn float32() -> Self {
        Self::new(SchemaKind::Float32)
    }

    pub fn float64() -> Self {
        Self::new(SchemaKind::Float64)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    pub fn bytes() -> Self {
        Self::new(SchemaKind::Bytes)
    }

    pub fn array(items: Schema) -> Self {
        Self::new(SchemaKind::Array(Box::new(items)))
    }

    pub fn map(keys: Schema, values: Schema) -> Self {
        Self::new(SchemaKind::Map(Box::new(keys), Box::new(values)))
    }

    /// Empty struct schema; add fields with `field()`.
    pub fn structure() -> Self {
        Self::new(SchemaKind::Struct(Vec::new()))
    }

    /// Append a field to a struct schema. No-op on other kinds.
    pub fn field(mut self, name: impl Into<std::string::String>, schema: Schema) -> Self {
        if let SchemaKind::Struct(fields) = &mut self.kind {
            fields.push(Field::new(name, schema));
        }
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn named(mut self, name: impl Into<std::string::String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declared fields of a struct schema, in declaration order.
    pub fn fields(&self) -> Option<&[Field]> {
        match &self.kind {
            SchemaKind::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}
