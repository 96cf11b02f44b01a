use core::fmt;
use std::collections::BTreeMap;

/// A decoded Avro datum, independent of any generated type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    /// Fields in reader-schema order.
    Record(Vec<(String, Value)>),
    Enum { index: usize, symbol: String },
    Fixed(Vec<u8>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Union { index: usize, value: Box<Value> },
}

impl Value {
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn union(index: usize, value: Value) -> Self {
        Value::Union {
            index,
            value: Box::new(value),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::Enum { .. } => "enum",
            Value::Fixed(_) => "fixed",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Union { .. } => "union",
        }
    }
}

fn write_bytes(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("b\"")?;
    for b in bytes {
        write!(f, "\\x{b:02x}")?;
    }
    f.write_str("\"")
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl IntoIterator<Item = T>,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

struct Entry<'a>(&'a str, &'a Value);

impl fmt::Display for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.0, self.1)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}L"),
            Value::Float(x) => write!(f, "{x:?}f"),
            Value::Double(x) => write!(f, "{x:?}"),
            Value::Bytes(bytes) | Value::Fixed(bytes) => write_bytes(f, bytes),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Record(fields) => write_list(
                f,
                "{",
                fields.iter().map(|(name, value)| Entry(name, value)),
                "}",
            ),
            Value::Enum { symbol, .. } => f.write_str(symbol),
            Value::Array(items) => write_list(f, "[", items, "]"),
            Value::Map(entries) => write_list(
                f,
                "map{",
                entries.iter().map(|(key, value)| Entry(key, value)),
                "}",
            ),
            Value::Union { index, value } => write!(f, "#{index}({value})"),
        }
    }
}
