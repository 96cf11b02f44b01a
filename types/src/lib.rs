//! Avro schema type model.
//!
//! Parses schema documents into a [`Schema`]: a root [`AvroType`] plus a table
//! of named [`Definition`]s keyed by [`QualifiedName`]. Named references are
//! resolved once at parse time, so later passes can look them up without
//! failing on well-formed input.
//!
//! # Example
//!
//! ```
//! use avrokit_types::{Resolved, Schema};
//!
//! let schema = Schema::parse(r#"{
//!     "type": "record", "name": "Node", "namespace": "list",
//!     "fields": [
//!         {"name": "value", "type": "int"},
//!         {"name": "next", "type": ["null", "Node"]}
//!     ]
//! }"#).unwrap();
//!
//! let Some(Resolved::Record(node)) = schema.resolve(schema.root()) else { panic!() };
//! assert_eq!(node.name.to_string(), "list.Node");
//! assert_eq!(node.fields.len(), 2);
//! ```

mod canonical;
mod compat;
mod error;
mod name;
mod parser;
mod schema;
mod ty;

pub use canonical::fingerprint64;
pub use compat::{is_exact_match, is_readable_by};
pub use error::SchemaError;
pub use name::QualifiedName;
pub use schema::{Resolved, Schema};
pub use ty::{
    AvroType, Definition, EnumDefinition, Field, FixedDefinition, Primitive, RecordDefinition,
};
