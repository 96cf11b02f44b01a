//! avrokit - Avro schema resolution compiled to bytecode
//!
//! # Overview
//!
//! Data written with one Avro schema (the writer schema) is often read by a
//! program that expects another (the reader schema): fields get added,
//! removed or renamed, numbers widen, enum symbols and union branches get
//! reordered. avrokit compiles each writer/reader pair once into a small
//! bytecode program and runs that program over the binary data, pushing
//! decoded values into a [`Sink`]. Nothing about the resolution is worked
//! out again per record.
//!
//! # Quick Start
//!
//! ```
//! use avrokit::{Engine, Value};
//!
//! let engine = Engine::default();
//! let writer = engine.parse_schema(r#"{"type": "record", "name": "User", "fields": [
//!     {"name": "name", "type": "string"},
//!     {"name": "visits", "type": "int"}
//! ]}"#).unwrap();
//! let reader = engine.parse_schema(r#"{"type": "record", "name": "User", "fields": [
//!     {"name": "visits", "type": "long"},
//!     {"name": "name", "type": "string"},
//!     {"name": "admin", "type": "boolean", "default": false}
//! ]}"#).unwrap();
//!
//! // name = "ada", visits = 2
//! let bytes = [0x06, b'a', b'd', b'a', 0x04];
//! let user = engine.decode_value(&writer, &reader, &mut &bytes[..]).unwrap();
//! assert_eq!(user, Value::record([
//!     ("visits", Value::Long(2)),
//!     ("name", Value::String("ada".to_string())),
//!     ("admin", Value::Boolean(false)),
//! ]));
//! ```
//!
//! # Decoding into your own types
//!
//! Any type implementing [`Sink`] can be a decoding target. A record
//! implements [`Sink::field`] to hand out its fields:
//!
//! ```
//! use avrokit::{Engine, Sink, SinkError};
//!
//! #[derive(Default)]
//! struct User {
//!     name: String,
//!     visits: i64,
//! }
//!
//! impl Sink for User {
//!     fn field(&mut self, index: usize) -> Result<&mut dyn Sink, SinkError> {
//!         match index {
//!             0 => Ok(&mut self.name),
//!             1 => Ok(&mut self.visits),
//!             _ => Err(SinkError::InvalidIndex { index: index as i64, target: "User" }),
//!         }
//!     }
//! }
//!
//! let engine = Engine::default();
//! let writer = engine.parse_schema(r#"{"type": "record", "name": "User", "fields": [
//!     {"name": "name", "type": "string"},
//!     {"name": "visits", "type": "int"}
//! ]}"#).unwrap();
//! let reader = engine.parse_schema(r#"{"type": "record", "name": "User", "fields": [
//!     {"name": "name", "type": "string"},
//!     {"name": "visits", "type": "long"}
//! ]}"#).unwrap();
//!
//! let program = engine.compile(&writer, &reader).unwrap();
//! let mut user = User::default();
//! engine.decode(&program, &mut &[0x02, b'x', 0x08][..], &mut user).unwrap();
//! assert_eq!((user.name.as_str(), user.visits), ("x", 4));
//! ```

// Error rendering utilities
pub mod error_renderer;
pub use error_renderer::{CharSet, RenderConfig, render_error, render_error_to};

// Re-export public API from avrokit_core
pub use avrokit_core::api::{Diagnostic, Engine, EngineOptions, Error, Severity};
pub use avrokit_core::{
    compiler::{CompileError, compile},
    container::{ContainerError, Reader, Writer, WriterOptions},
    encoder::{EncodeError, encode},
    vm::{EvalOptions, ExecutionError, Program, eval},
};

pub use avrokit_types::{Schema, SchemaError};
pub use avrokit_values::{Sink, SinkError, Value, ValueSink};
