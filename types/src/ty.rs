//! The Avro type tree.
//!
//! Anonymous types (primitives, arrays, maps and unions) are stored inline.
//! Named types are lifted into the owning [`Schema`](crate::Schema)'s definition
//! table and appear in the tree only as [`AvroType::Reference`], which keeps
//! self-referential schemas acyclic in memory.

use core::fmt;

use crate::QualifiedName;

/// Primitive Avro types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Null,
        Primitive::Boolean,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Bytes,
        Primitive::String,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Bytes => "bytes",
            Primitive::String => "string",
        }
    }

    /// Whether data written as `self` can be read as `reader`.
    pub fn promotes_to(self, reader: Primitive) -> bool {
        use Primitive::*;
        self == reader
            || matches!(
                (self, reader),
                (Int, Long | Float | Double)
                    | (Long, Float | Double)
                    | (Float, Double)
                    | (String, Bytes)
                    | (Bytes, String)
            )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvroType {
    Primitive(Primitive),
    Array(Box<AvroType>),
    Map(Box<AvroType>),
    Union(Vec<AvroType>),
    /// A named type, resolved through the schema's definition table.
    Reference(QualifiedName),
}

impl AvroType {
    pub fn is_null(&self) -> bool {
        matches!(self, AvroType::Primitive(Primitive::Null))
    }
}

impl From<Primitive> for AvroType {
    fn from(primitive: Primitive) -> Self {
        AvroType::Primitive(primitive)
    }
}

impl fmt::Display for AvroType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvroType::Primitive(p) => write!(f, "{p}"),
            AvroType::Array(items) => write!(f, "array<{items}>"),
            AvroType::Map(values) => write!(f, "map<{values}>"),
            AvroType::Union(branches) => {
                f.write_str("union[")?;
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{branch}")?;
                }
                f.write_str("]")
            }
            AvroType::Reference(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: AvroType,
    pub aliases: Vec<String>,
    /// The JSON default; `Some(Value::Null)` is an explicit `null` default.
    pub default: Option<serde_json::Value>,
    pub doc: Option<String>,
}

impl Field {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether this field answers to `name`, directly or through an alias.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefinition {
    pub name: QualifiedName,
    pub aliases: Vec<QualifiedName>,
    pub fields: Vec<Field>,
    pub doc: Option<String>,
}

impl RecordDefinition {
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Find the field that should receive data written for `writer`:
    /// an exact name match first, then a field listing the writer's name as an alias.
    pub fn reader_field_for(&self, writer: &Field) -> Option<(usize, &Field)> {
        self.field(&writer.name).or_else(|| {
            self.fields
                .iter()
                .enumerate()
                .find(|(_, f)| f.aliases.iter().any(|alias| *alias == writer.name))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDefinition {
    pub name: QualifiedName,
    pub aliases: Vec<QualifiedName>,
    pub symbols: Vec<String>,
    /// Symbol used when reading a writer symbol this enum does not declare.
    pub default: Option<String>,
    pub doc: Option<String>,
}

impl EnumDefinition {
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedDefinition {
    pub name: QualifiedName,
    pub aliases: Vec<QualifiedName>,
    pub size: usize,
}

/// A record, enum or fixed declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Record(RecordDefinition),
    Enum(EnumDefinition),
    Fixed(FixedDefinition),
}

impl Definition {
    pub fn name(&self) -> &QualifiedName {
        match self {
            Definition::Record(r) => &r.name,
            Definition::Enum(e) => &e.name,
            Definition::Fixed(f) => &f.name,
        }
    }

    pub fn aliases(&self) -> &[QualifiedName] {
        match self {
            Definition::Record(r) => &r.aliases,
            Definition::Enum(e) => &e.aliases,
            Definition::Fixed(f) => &f.aliases,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Definition::Record(_) => "record",
            Definition::Enum(_) => "enum",
            Definition::Fixed(_) => "fixed",
        }
    }

    /// Whether data written under the named type `writer` may be read as `self`.
    ///
    /// Names match on their unqualified part, or when `self` lists the
    /// writer's full name among its aliases.
    pub fn accepts_name(&self, writer: &QualifiedName) -> bool {
        accepts_name(self.name(), self.aliases(), writer)
    }
}

pub(crate) fn accepts_name(
    reader: &QualifiedName,
    aliases: &[QualifiedName],
    writer: &QualifiedName,
) -> bool {
    reader.name == writer.name || aliases.contains(writer)
}
