use hashbrown::HashMap;

use crate::{
    AvroType, Definition, EnumDefinition, FixedDefinition, Primitive, QualifiedName,
    RecordDefinition, SchemaError, parser::Parser,
};

/// A parsed schema document: the root type plus the table of every named
/// type it declares.
///
/// Every [`AvroType::Reference`] reachable from the root names an entry of the
/// table; this is established by [`Schema::parse`] and never changes afterwards.
#[derive(Debug, Clone)]
pub struct Schema {
    root: AvroType,
    definitions: HashMap<QualifiedName, Definition>,
    /// Definition names in declaration order.
    order: Vec<QualifiedName>,
    source: String,
}

/// A type node with named references looked up.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Primitive(Primitive),
    Array(&'a AvroType),
    Map(&'a AvroType),
    Union(&'a [AvroType]),
    Record(&'a RecordDefinition),
    Enum(&'a EnumDefinition),
    Fixed(&'a FixedDefinition),
}

impl Resolved<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Resolved::Primitive(p) => p.name(),
            Resolved::Array(_) => "array",
            Resolved::Map(_) => "map",
            Resolved::Union(_) => "union",
            Resolved::Record(_) => "record",
            Resolved::Enum(_) => "enum",
            Resolved::Fixed(_) => "fixed",
        }
    }
}

impl Schema {
    /// Parse a JSON schema document and resolve all of its named references.
    pub fn parse(json: &str) -> Result<Self, SchemaError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        let mut parser = Parser::default();
        let root = parser.parse_type(&document, "")?;
        let (definitions, order) = parser.finish();

        let mut schema = Schema {
            root,
            definitions,
            order,
            source: json.to_string(),
        };
        schema.resolve_references()?;
        Ok(schema)
    }

    pub fn root(&self) -> &AvroType {
        &self.root
    }

    /// The JSON text this schema was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn definition(&self, name: &QualifiedName) -> Option<&Definition> {
        self.definitions.get(name)
    }

    /// All named definitions, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.order.iter().filter_map(|name| self.definitions.get(name))
    }

    pub fn resolve<'a>(&'a self, ty: &'a AvroType) -> Option<Resolved<'a>> {
        Some(match ty {
            AvroType::Primitive(p) => Resolved::Primitive(*p),
            AvroType::Array(items) => Resolved::Array(items),
            AvroType::Map(values) => Resolved::Map(values),
            AvroType::Union(branches) => Resolved::Union(branches),
            AvroType::Reference(name) => match self.definitions.get(name)? {
                Definition::Record(r) => Resolved::Record(r),
                Definition::Enum(e) => Resolved::Enum(e),
                Definition::Fixed(f) => Resolved::Fixed(f),
            },
        })
    }

    /// Point every reference at an existing definition.
    ///
    /// A name that is not declared under its own namespace is retried in the
    /// null namespace before giving up.
    fn resolve_references(&mut self) -> Result<(), SchemaError> {
        let known: Vec<QualifiedName> = self.definitions.keys().cloned().collect();
        let lookup = |name: &mut QualifiedName| -> Result<(), SchemaError> {
            if known.contains(name) {
                return Ok(());
            }
            let bare = name.unqualified();
            if known.contains(&bare) {
                *name = bare;
                return Ok(());
            }
            Err(SchemaError::UnresolvedReference(name.clone()))
        };

        visit_references(&mut self.root, &lookup)?;
        for definition in self.definitions.values_mut() {
            if let Definition::Record(record) = definition {
                for field in &mut record.fields {
                    visit_references(&mut field.ty, &lookup)?;
                }
            }
        }
        Ok(())
    }
}

fn visit_references(
    ty: &mut AvroType,
    lookup: &impl Fn(&mut QualifiedName) -> Result<(), SchemaError>,
) -> Result<(), SchemaError> {
    match ty {
        AvroType::Primitive(_) => Ok(()),
        AvroType::Array(inner) | AvroType::Map(inner) => visit_references(inner, lookup),
        AvroType::Union(branches) => branches
            .iter_mut()
            .try_for_each(|branch| visit_references(branch, lookup)),
        AvroType::Reference(name) => lookup(name),
    }
}
