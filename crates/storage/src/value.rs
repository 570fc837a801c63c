use std::fmt;

/// Text substituted for binary payloads when a cell is read as text.
pub const BINARY_PLACEHOLDER: &str = "<binary>";

/// A single cell value.
///
/// Equality is per tag: values of different tags never compare equal,
/// even when their text forms agree (`Int32(1) != String("1")`).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Int32(i32),
    Double(f64),
    Blob(Vec<u8>),
    Geometry(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Int32(_) => "int32",
            Value::Double(_) => "double",
            Value::Blob(_) => "blob",
            Value::Geometry(_) => "geometry",
        }
    }

    /// Text form of the value, or `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Int32(i) => Some(i.to_string()),
            Value::Double(d) => Some(d.to_string()),
            Value::Blob(_) | Value::Geometry(_) => Some(BINARY_PLACEHOLDER.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::String(s) => f.write_str(s),
            Value::Int32(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Blob(_) | Value::Geometry(_) => f.write_str(BINARY_PLACEHOLDER),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}
