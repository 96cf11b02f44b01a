//! Decoding targets.
//!
//! A decoding program never builds values itself; it drives a [`Sink`], the
//! capability set a target type implements for its shape. This crate holds
//! the trait, implementations for plain Rust types, and [`ValueSink`], a
//! schema-driven sink producing a dynamic [`Value`].

mod default;
mod error;
mod primitives;
mod sink;
mod value;
mod value_sink;

pub use error::{DefaultValueError, SinkError};
pub use sink::{Sink, unsupported};
pub use value::Value;
pub use value_sink::ValueSink;
