//! JSON schema document → type tree.

use hashbrown::HashMap;
use serde_json::{Map, Value};

use crate::{
    AvroType, Definition, EnumDefinition, Field, FixedDefinition, Primitive, QualifiedName,
    RecordDefinition, SchemaError,
};

type Object = Map<String, Value>;

#[derive(Default)]
pub(crate) struct Parser {
    definitions: HashMap<QualifiedName, Definition>,
    order: Vec<QualifiedName>,
}

impl Parser {
    pub(crate) fn finish(self) -> (HashMap<QualifiedName, Definition>, Vec<QualifiedName>) {
        (self.definitions, self.order)
    }

    /// Parse one type expression; `namespace` is the enclosing namespace.
    pub(crate) fn parse_type(
        &mut self,
        json: &Value,
        namespace: &str,
    ) -> Result<AvroType, SchemaError> {
        match json {
            Value::String(name) => Ok(self.named_or_primitive(name, namespace)),
            Value::Array(branches) => {
                let branches = branches
                    .iter()
                    .map(|branch| self.parse_type(branch, namespace))
                    .collect::<Result<Vec<_>, _>>()?;
                if branches.iter().any(|b| matches!(b, AvroType::Union(_))) {
                    return Err(SchemaError::Invalid(
                        "unions may not immediately contain other unions".into(),
                    ));
                }
                Ok(AvroType::Union(branches))
            }
            Value::Object(object) => self.parse_object(object, namespace),
            other => Err(SchemaError::Invalid(format!(
                "expected a type name, object or union, found `{other}`"
            ))),
        }
    }

    fn named_or_primitive(&self, name: &str, namespace: &str) -> AvroType {
        match Primitive::from_name(name) {
            Some(primitive) => AvroType::Primitive(primitive),
            None => AvroType::Reference(QualifiedName::parse(name, namespace)),
        }
    }

    fn parse_object(&mut self, object: &Object, namespace: &str) -> Result<AvroType, SchemaError> {
        let ty = object
            .get("type")
            .ok_or_else(|| SchemaError::MissingAttribute {
                attribute: "type",
                context: "type object".into(),
            })?;

        let Value::String(type_name) = ty else {
            // `{"type": {...}}` or `{"type": [...]}` wraps another type expression.
            return self.parse_type(ty, namespace);
        };

        match type_name.as_str() {
            "record" | "error" => self.parse_record(object, namespace),
            "enum" => self.parse_enum(object, namespace),
            "fixed" => self.parse_fixed(object, namespace),
            "array" => {
                let items = required(object, "items", "array")?;
                Ok(AvroType::Array(Box::new(self.parse_type(items, namespace)?)))
            }
            "map" => {
                let values = required(object, "values", "map")?;
                Ok(AvroType::Map(Box::new(self.parse_type(values, namespace)?)))
            }
            // Primitives, possibly annotated with a logical type that we read as
            // the underlying representation, or a reference to a named type.
            name => Ok(self.named_or_primitive(name, namespace)),
        }
    }

    /// Read the `name`, `namespace` and `aliases` shared by all named types,
    /// and reserve the name in declaration order.
    fn declare(
        &mut self,
        object: &Object,
        enclosing: &str,
        kind: &'static str,
    ) -> Result<(QualifiedName, Vec<QualifiedName>), SchemaError> {
        let name = required_str(object, "name", kind)?;
        let namespace = match object.get("namespace") {
            Some(Value::String(ns)) => ns.as_str(),
            _ => enclosing,
        };
        let name = QualifiedName::parse(name, namespace);
        let aliases = string_list(object, "aliases")?
            .into_iter()
            .map(|alias| QualifiedName::parse(&alias, &name.namespace))
            .collect();

        if self.definitions.contains_key(&name) || self.order.contains(&name) {
            return Err(SchemaError::DuplicateDefinition(name));
        }
        self.order.push(name.clone());
        Ok((name, aliases))
    }

    fn define(&mut self, definition: Definition) -> AvroType {
        let name = definition.name().clone();
        self.definitions.insert(name.clone(), definition);
        AvroType::Reference(name)
    }

    fn parse_record(&mut self, object: &Object, enclosing: &str) -> Result<AvroType, SchemaError> {
        let (name, aliases) = self.declare(object, enclosing, "record")?;
        let Value::Array(fields_json) = required(object, "fields", "record")? else {
            return Err(SchemaError::Invalid(format!(
                "fields of record `{name}` must be an array"
            )));
        };

        let mut fields: Vec<Field> = Vec::with_capacity(fields_json.len());
        for field_json in fields_json {
            let Value::Object(field_object) = field_json else {
                return Err(SchemaError::Invalid(format!(
                    "field of record `{name}` must be an object"
                )));
            };
            let field_name = required_str(field_object, "name", "field")?;
            if fields.iter().any(|f| f.name == field_name) {
                return Err(SchemaError::Invalid(format!(
                    "record `{name}` declares field `{field_name}` twice"
                )));
            }
            let ty = required(field_object, "type", "field")?;
            fields.push(Field {
                name: field_name.to_string(),
                ty: self.parse_type(ty, &name.namespace)?,
                aliases: string_list(field_object, "aliases")?,
                default: field_object.get("default").cloned(),
                doc: optional_str(field_object, "doc"),
            });
        }

        Ok(self.define(Definition::Record(RecordDefinition {
            doc: optional_str(object, "doc"),
            name,
            aliases,
            fields,
        })))
    }

    fn parse_enum(&mut self, object: &Object, enclosing: &str) -> Result<AvroType, SchemaError> {
        let (name, aliases) = self.declare(object, enclosing, "enum")?;
        if !matches!(object.get("symbols"), Some(Value::Array(_))) {
            return Err(SchemaError::MissingAttribute {
                attribute: "symbols",
                context: format!("enum `{name}`"),
            });
        }
        let symbols = string_list(object, "symbols")?;
        let default = optional_str(object, "default");
        if let Some(default) = &default {
            if !symbols.contains(default) {
                return Err(SchemaError::Invalid(format!(
                    "default `{default}` of enum `{name}` is not one of its symbols"
                )));
            }
        }

        Ok(self.define(Definition::Enum(EnumDefinition {
            doc: optional_str(object, "doc"),
            name,
            aliases,
            symbols,
            default,
        })))
    }

    fn parse_fixed(&mut self, object: &Object, enclosing: &str) -> Result<AvroType, SchemaError> {
        let (name, aliases) = self.declare(object, enclosing, "fixed")?;
        let size = required(object, "size", "fixed")?
            .as_u64()
            .ok_or_else(|| {
                SchemaError::Invalid(format!("size of fixed `{name}` must be a non-negative integer"))
            })?;

        Ok(self.define(Definition::Fixed(FixedDefinition {
            name,
            aliases,
            size: size as usize,
        })))
    }
}

fn required<'a>(
    object: &'a Object,
    attribute: &'static str,
    context: &str,
) -> Result<&'a Value, SchemaError> {
    object
        .get(attribute)
        .ok_or_else(|| SchemaError::MissingAttribute {
            attribute,
            context: context.to_string(),
        })
}

fn required_str<'a>(
    object: &'a Object,
    attribute: &'static str,
    context: &str,
) -> Result<&'a str, SchemaError> {
    required(object, attribute, context)?
        .as_str()
        .ok_or_else(|| SchemaError::Invalid(format!("`{attribute}` of {context} must be a string")))
}

fn optional_str(object: &Object, attribute: &str) -> Option<String> {
    object
        .get(attribute)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn string_list(object: &Object, attribute: &str) -> Result<Vec<String>, SchemaError> {
    match object.get(attribute) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    SchemaError::Invalid(format!("`{attribute}` must only contain strings"))
                })
            })
            .collect(),
        Some(_) => Err(SchemaError::Invalid(format!(
            "`{attribute}` must be an array of strings"
        ))),
    }
}
