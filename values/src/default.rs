//! JSON field defaults → [`Value`].

use std::collections::BTreeMap;

use avrokit_types::{AvroType, Primitive, Resolved, Schema};
use serde_json::Value as Json;

use crate::{DefaultValueError, Value};

impl Value {
    /// Interpret the JSON `default` declared for a field of type `ty`.
    ///
    /// Union defaults always describe the first branch. Bytes and fixed
    /// defaults are strings whose code points are the byte values.
    pub fn from_default(schema: &Schema, ty: &AvroType, json: &Json) -> Result<Value, DefaultValueError> {
        let resolved = schema
            .resolve(ty)
            .ok_or_else(|| DefaultValueError::Unresolved(ty.to_string()))?;

        match resolved {
            Resolved::Primitive(primitive) => primitive_default(primitive, json),
            Resolved::Array(items) => match json {
                Json::Array(elements) => elements
                    .iter()
                    .map(|element| Value::from_default(schema, items, element))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                _ => Err(DefaultValueError::mismatch(ty.to_string(), json)),
            },
            Resolved::Map(values) => match json {
                Json::Object(entries) => entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), Value::from_default(schema, values, value)?)))
                    .collect::<Result<BTreeMap<_, _>, DefaultValueError>>()
                    .map(Value::Map),
                _ => Err(DefaultValueError::mismatch(ty.to_string(), json)),
            },
            Resolved::Union(branches) => {
                let first = branches
                    .first()
                    .ok_or_else(|| DefaultValueError::mismatch("empty union", json))?;
                Ok(Value::union(0, Value::from_default(schema, first, json)?))
            }
            Resolved::Record(record) => {
                let Json::Object(entries) = json else {
                    return Err(DefaultValueError::mismatch(record.name.to_string(), json));
                };
                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    let field_json = entries
                        .get(&field.name)
                        .or(field.default.as_ref())
                        .ok_or_else(|| DefaultValueError::MissingField {
                            record: record.name.to_string(),
                            field: field.name.clone(),
                        })?;
                    fields.push((field.name.clone(), Value::from_default(schema, &field.ty, field_json)?));
                }
                Ok(Value::Record(fields))
            }
            Resolved::Enum(definition) => {
                let index = json
                    .as_str()
                    .and_then(|symbol| definition.symbol_index(symbol))
                    .ok_or_else(|| DefaultValueError::mismatch(definition.name.to_string(), json))?;
                Ok(Value::Enum {
                    index,
                    symbol: definition.symbols[index].clone(),
                })
            }
            Resolved::Fixed(definition) => {
                let bytes = latin1_bytes(json)
                    .filter(|bytes| bytes.len() == definition.size)
                    .ok_or_else(|| DefaultValueError::mismatch(definition.name.to_string(), json))?;
                Ok(Value::Fixed(bytes))
            }
        }
    }
}

fn primitive_default(primitive: Primitive, json: &Json) -> Result<Value, DefaultValueError> {
    let value = match primitive {
        Primitive::Null => json.is_null().then_some(Value::Null),
        Primitive::Boolean => json.as_bool().map(Value::Boolean),
        Primitive::Int => json
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int),
        Primitive::Long => json.as_i64().map(Value::Long),
        Primitive::Float => json.as_f64().map(|x| Value::Float(x as f32)),
        Primitive::Double => json.as_f64().map(Value::Double),
        Primitive::Bytes => latin1_bytes(json).map(Value::Bytes),
        Primitive::String => json.as_str().map(|s| Value::String(s.to_string())),
    };
    value.ok_or_else(|| DefaultValueError::mismatch(primitive.name(), json))
}

fn latin1_bytes(json: &Json) -> Option<Vec<u8>> {
    json.as_str()?
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

#[cfg(test)]
#[path = "default_test.rs"]
mod default_test;
