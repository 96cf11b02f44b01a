//! Public API for resolving and decoding Avro data.
//!
//! # Example
//!
//! ```
//! use avrokit_core::api::{Engine, EngineOptions};
//! use avrokit_values::Value;
//!
//! let engine = Engine::new(EngineOptions::default());
//! let writer = engine.parse_schema(r#"{"type": "record", "name": "P", "fields": [
//!     {"name": "x", "type": "int"}
//! ]}"#).unwrap();
//! let reader = engine.parse_schema(r#"{"type": "record", "name": "P", "fields": [
//!     {"name": "x", "type": "double"},
//!     {"name": "y", "type": "double", "default": 1.5}
//! ]}"#).unwrap();
//!
//! // x = 3
//! let value = engine.decode_value(&writer, &reader, &mut &[0x06u8][..]).unwrap();
//! assert_eq!(value, Value::record([("x", Value::Double(3.0)), ("y", Value::Double(1.5))]));
//! ```

pub mod engine;
pub mod error;
pub mod options;

pub use engine::Engine;
pub use error::{Diagnostic, Error, Severity};
pub use options::EngineOptions;
