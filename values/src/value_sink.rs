//! A schema-driven [`Sink`] that assembles a [`Value`].
//!
//! `ValueSink` plays the part a generated record, union, enum or fixed type
//! would: it knows the reader type it stands for and accepts only the
//! operations that type supports. Nested sinks are created on demand when
//! the program enters a field, branch or container element, and the whole
//! tree is collapsed into a [`Value`] by [`ValueSink::into_value`].

use avrokit_types::{AvroType, Primitive, Resolved, Schema};

use crate::{Sink, SinkError, Value, sink::unsupported};

pub struct ValueSink<'s> {
    schema: &'s Schema,
    shape: Option<Resolved<'s>>,
    node: Node<'s>,
}

enum Node<'s> {
    Unset,
    Done(Value),
    Record(Vec<Option<ValueSink<'s>>>),
    Array(Vec<ValueSink<'s>>),
    Map(Vec<(String, ValueSink<'s>)>),
    Union {
        index: Option<usize>,
        branch: Option<Box<ValueSink<'s>>>,
    },
}

impl<'s> ValueSink<'s> {
    /// A sink for the root type of `schema`.
    pub fn new(schema: &'s Schema) -> Self {
        Self::for_type(schema, schema.root())
    }

    pub fn for_type(schema: &'s Schema, ty: &'s AvroType) -> Self {
        let shape = schema.resolve(ty);
        let node = match shape {
            Some(Resolved::Primitive(Primitive::Null)) => Node::Done(Value::Null),
            Some(Resolved::Record(record)) => {
                Node::Record(record.fields.iter().map(|_| None).collect())
            }
            Some(Resolved::Array(_)) => Node::Array(Vec::new()),
            Some(Resolved::Map(_)) => Node::Map(Vec::new()),
            Some(Resolved::Union(_)) => Node::Union {
                index: None,
                branch: None,
            },
            _ => Node::Unset,
        };
        Self {
            schema,
            shape,
            node,
        }
    }

    fn is(&self, primitive: Primitive) -> bool {
        matches!(self.shape, Some(Resolved::Primitive(p)) if p == primitive)
    }

    fn done(&mut self, operation: &'static str, primitive: Primitive, value: Value) -> Result<(), SinkError> {
        if !self.is(primitive) {
            return Err(unsupported(operation, self.type_name()));
        }
        self.node = Node::Done(value);
        Ok(())
    }

    /// Collapse the sink tree into the value it received.
    ///
    /// Record fields and union branches of type `null` need no traffic and
    /// read as [`Value::Null`]; anything else left unpopulated is an error.
    pub fn into_value(self) -> Result<Value, SinkError> {
        let kind = self.type_name();
        match self.node {
            Node::Done(value) => Ok(value),
            Node::Unset => Err(SinkError::Incomplete(kind.to_string())),
            Node::Record(children) => {
                let Some(Resolved::Record(record)) = self.shape else {
                    return Err(SinkError::Incomplete(kind.to_string()));
                };
                let mut fields = Vec::with_capacity(children.len());
                for (field, child) in record.fields.iter().zip(children) {
                    let value = match child {
                        Some(child) => child.into_value()?,
                        None if field.ty.is_null() => Value::Null,
                        None => {
                            return Err(SinkError::Incomplete(format!(
                                "field `{}` of `{}`",
                                field.name, record.name
                            )));
                        }
                    };
                    fields.push((field.name.clone(), value));
                }
                Ok(Value::Record(fields))
            }
            Node::Array(items) => items
                .into_iter()
                .map(ValueSink::into_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Node::Map(entries) => entries
                .into_iter()
                .map(|(key, sink)| Ok((key, sink.into_value()?)))
                .collect::<Result<_, SinkError>>()
                .map(Value::Map),
            Node::Union { index: None, .. } => Err(SinkError::Incomplete(kind.to_string())),
            Node::Union {
                index: Some(index),
                branch,
            } => {
                let value = match branch {
                    Some(branch) => branch.into_value()?,
                    None => ValueSink::for_branch(self.schema, self.shape, index)?.into_value()?,
                };
                Ok(Value::union(index, value))
            }
        }
    }

    fn for_branch(
        schema: &'s Schema,
        shape: Option<Resolved<'s>>,
        index: usize,
    ) -> Result<ValueSink<'s>, SinkError> {
        match shape {
            Some(Resolved::Union(branches)) => branches
                .get(index)
                .map(|ty| ValueSink::for_type(schema, ty))
                .ok_or(SinkError::InvalidIndex {
                    index: index as i64,
                    target: "union",
                }),
            _ => Err(unsupported("field", "union")),
        }
    }
}

impl Sink for ValueSink<'_> {
    fn type_name(&self) -> &'static str {
        self.shape.as_ref().map_or("unresolved", Resolved::kind_name)
    }

    fn set_boolean(&mut self, value: bool) -> Result<(), SinkError> {
        self.done("set_boolean", Primitive::Boolean, Value::Boolean(value))
    }

    fn set_int(&mut self, value: i32) -> Result<(), SinkError> {
        self.done("set_int", Primitive::Int, Value::Int(value))
    }

    fn set_long(&mut self, value: i64) -> Result<(), SinkError> {
        match self.shape {
            Some(Resolved::Union(branches)) => {
                let selected = usize::try_from(value)
                    .ok()
                    .filter(|&i| i < branches.len())
                    .ok_or(SinkError::InvalidIndex {
                        index: value,
                        target: "union",
                    })?;
                self.node = Node::Union {
                    index: Some(selected),
                    branch: None,
                };
                Ok(())
            }
            Some(Resolved::Enum(definition)) => {
                let symbol = usize::try_from(value)
                    .ok()
                    .and_then(|i| definition.symbols.get(i))
                    .ok_or(SinkError::InvalidIndex {
                        index: value,
                        target: "enum",
                    })?;
                self.node = Node::Done(Value::Enum {
                    index: value as usize,
                    symbol: symbol.clone(),
                });
                Ok(())
            }
            _ => self.done("set_long", Primitive::Long, Value::Long(value)),
        }
    }

    fn set_float(&mut self, value: f32) -> Result<(), SinkError> {
        self.done("set_float", Primitive::Float, Value::Float(value))
    }

    fn set_double(&mut self, value: f64) -> Result<(), SinkError> {
        self.done("set_double", Primitive::Double, Value::Double(value))
    }

    fn set_bytes(&mut self, value: Vec<u8>) -> Result<(), SinkError> {
        if let Some(Resolved::Fixed(definition)) = self.shape {
            if value.len() != definition.size {
                return Err(SinkError::FixedSize {
                    expected: definition.size,
                    actual: value.len(),
                });
            }
            self.node = Node::Done(Value::Fixed(value));
            return Ok(());
        }
        self.done("set_bytes", Primitive::Bytes, Value::Bytes(value))
    }

    fn set_string(&mut self, value: String) -> Result<(), SinkError> {
        self.done("set_string", Primitive::String, Value::String(value))
    }

    fn field(&mut self, index: usize) -> Result<&mut dyn Sink, SinkError> {
        let (schema, name) = (self.schema, self.type_name());
        match (self.shape, &mut self.node) {
            (Some(Resolved::Record(record)), Node::Record(children)) => {
                let field = record.fields.get(index).ok_or(SinkError::InvalidIndex {
                    index: index as i64,
                    target: "record",
                })?;
                let child = &mut children[index];
                Ok(child.insert(ValueSink::for_type(schema, &field.ty)))
            }
            (shape @ Some(Resolved::Union(_)), Node::Union { index: selected, branch }) => {
                let sink = ValueSink::for_branch(schema, shape, index)?;
                *selected = Some(index);
                Ok(branch.insert(Box::new(sink)).as_mut())
            }
            _ => Err(unsupported("field", name)),
        }
    }

    fn set_default(&mut self, index: usize) -> Result<(), SinkError> {
        let (schema, name) = (self.schema, self.type_name());
        match (self.shape, &mut self.node) {
            (Some(Resolved::Record(record)), Node::Record(children)) => {
                let field = record.fields.get(index).ok_or(SinkError::InvalidIndex {
                    index: index as i64,
                    target: "record",
                })?;
                let json = field.default.as_ref().ok_or_else(|| {
                    SinkError::Incomplete(format!("default of field `{}`", field.name))
                })?;
                let value = Value::from_default(schema, &field.ty, json)?;
                children[index] = Some(ValueSink {
                    schema,
                    shape: schema.resolve(&field.ty),
                    node: Node::Done(value),
                });
                Ok(())
            }
            _ => Err(unsupported("set_default", name)),
        }
    }

    fn append_array(&mut self) -> Result<&mut dyn Sink, SinkError> {
        let (schema, name) = (self.schema, self.type_name());
        match (self.shape, &mut self.node) {
            (Some(Resolved::Array(items)), Node::Array(elements)) => {
                elements.push(ValueSink::for_type(schema, items));
                let last = elements.len() - 1;
                Ok(&mut elements[last])
            }
            _ => Err(unsupported("append_array", name)),
        }
    }

    fn append_map(&mut self, key: String) -> Result<&mut dyn Sink, SinkError> {
        let (schema, name) = (self.schema, self.type_name());
        match (self.shape, &mut self.node) {
            (Some(Resolved::Map(values)), Node::Map(entries)) => {
                entries.push((key, ValueSink::for_type(schema, values)));
                let last = entries.len() - 1;
                Ok(&mut entries[last].1)
            }
            _ => Err(unsupported("append_map", name)),
        }
    }
}

#[cfg(test)]
#[path = "value_sink_test.rs"]
mod value_sink_test;
