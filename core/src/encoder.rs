//! Writes a [`Value`] in the binary encoding of a schema.
//!
//! Arrays and maps are written as a single block followed by the empty
//! terminating block.

use std::io::{self, Write};

use avrokit_types::{AvroType, Primitive, Resolved, Schema};
use avrokit_values::Value;
use thiserror::Error;

use crate::codec;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("expected {expected}, got {actual}")]
    Mismatch {
        expected: String,
        actual: &'static str,
    },

    #[error("record `{record}` has no value for field `{field}`")]
    MissingField { record: String, field: String },

    #[error("`{symbol}` is not a symbol of enum `{name}`")]
    UnknownSymbol { name: String, symbol: String },

    #[error("union `{union}` has no branch {index}")]
    InvalidBranch { union: String, index: usize },

    #[error("fixed `{name}` must be {expected} bytes, got {actual}")]
    FixedSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("unresolved type reference `{0}`")]
    Unresolved(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Encode `value` as the root type of `schema`.
pub fn encode<W: Write + ?Sized>(
    schema: &Schema,
    value: &Value,
    writer: &mut W,
) -> Result<(), EncodeError> {
    encode_type(schema, schema.root(), value, writer)
}

fn mismatch(ty: &AvroType, value: &Value) -> EncodeError {
    EncodeError::Mismatch {
        expected: ty.to_string(),
        actual: value.kind_name(),
    }
}

fn encode_type<W: Write + ?Sized>(
    schema: &Schema,
    ty: &AvroType,
    value: &Value,
    w: &mut W,
) -> Result<(), EncodeError> {
    let resolved = schema
        .resolve(ty)
        .ok_or_else(|| EncodeError::Unresolved(ty.to_string()))?;

    match (resolved, value) {
        (Resolved::Primitive(primitive), value) => encode_primitive(primitive, value, w)
            .ok_or_else(|| mismatch(ty, value))??,
        (Resolved::Record(record), Value::Record(_)) => {
            for field in &record.fields {
                let field_value = value.field(&field.name).ok_or_else(|| EncodeError::MissingField {
                    record: record.name.to_string(),
                    field: field.name.clone(),
                })?;
                encode_type(schema, &field.ty, field_value, w)?;
            }
        }
        (Resolved::Enum(definition), Value::Enum { symbol, .. }) => {
            let index = definition
                .symbol_index(symbol)
                .ok_or_else(|| EncodeError::UnknownSymbol {
                    name: definition.name.to_string(),
                    symbol: symbol.clone(),
                })?;
            codec::write_int(w, index as i32)?;
        }
        (Resolved::Fixed(definition), Value::Fixed(bytes)) => {
            if bytes.len() != definition.size {
                return Err(EncodeError::FixedSize {
                    name: definition.name.to_string(),
                    expected: definition.size,
                    actual: bytes.len(),
                });
            }
            w.write_all(bytes)?;
        }
        (Resolved::Array(items), Value::Array(elements)) => {
            if !elements.is_empty() {
                codec::write_long(w, elements.len() as i64)?;
                for element in elements {
                    encode_type(schema, items, element, w)?;
                }
            }
            codec::write_long(w, 0)?;
        }
        (Resolved::Map(values), Value::Map(entries)) => {
            if !entries.is_empty() {
                codec::write_long(w, entries.len() as i64)?;
                for (key, entry) in entries {
                    codec::write_string(w, key)?;
                    encode_type(schema, values, entry, w)?;
                }
            }
            codec::write_long(w, 0)?;
        }
        (Resolved::Union(branches), Value::Union { index, value }) => {
            let branch = branches.get(*index).ok_or_else(|| EncodeError::InvalidBranch {
                union: ty.to_string(),
                index: *index,
            })?;
            codec::write_long(w, *index as i64)?;
            encode_type(schema, branch, value, w)?;
        }
        (_, value) => return Err(mismatch(ty, value)),
    }
    Ok(())
}

/// `None` when `value` is not of the primitive's kind.
fn encode_primitive<W: Write + ?Sized>(
    primitive: Primitive,
    value: &Value,
    w: &mut W,
) -> Option<io::Result<()>> {
    Some(match (primitive, value) {
        (Primitive::Null, Value::Null) => Ok(()),
        (Primitive::Boolean, Value::Boolean(b)) => codec::write_boolean(w, *b),
        (Primitive::Int, Value::Int(n)) => codec::write_int(w, *n),
        (Primitive::Long, Value::Long(n)) => codec::write_long(w, *n),
        (Primitive::Float, Value::Float(x)) => codec::write_float(w, *x),
        (Primitive::Double, Value::Double(x)) => codec::write_double(w, *x),
        (Primitive::Bytes, Value::Bytes(bytes)) => codec::write_bytes(w, bytes),
        (Primitive::String, Value::String(s)) => codec::write_string(w, s),
        _ => return None,
    })
}

#[cfg(test)]
#[path = "encoder_test.rs"]
mod encoder_test;
