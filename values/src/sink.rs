//! The capability set a decoding program drives.
//!
//! Every method has a default that fails with [`SinkError::Unsupported`], so a
//! target implements only the operations meaningful for its shape: a record
//! implements [`Sink::field`] and [`Sink::set_default`], an enum implements
//! [`Sink::set_long`], and so on. Nothing is ever silently ignored.

use crate::SinkError;

pub trait Sink {
    /// Name used in error messages.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn set_boolean(&mut self, _value: bool) -> Result<(), SinkError> {
        Err(unsupported("set_boolean", self.type_name()))
    }

    fn set_int(&mut self, _value: i32) -> Result<(), SinkError> {
        Err(unsupported("set_int", self.type_name()))
    }

    /// Also used to select a union branch and to deliver an enum ordinal.
    fn set_long(&mut self, _value: i64) -> Result<(), SinkError> {
        Err(unsupported("set_long", self.type_name()))
    }

    fn set_float(&mut self, _value: f32) -> Result<(), SinkError> {
        Err(unsupported("set_float", self.type_name()))
    }

    fn set_double(&mut self, _value: f64) -> Result<(), SinkError> {
        Err(unsupported("set_double", self.type_name()))
    }

    /// Bytes and fixed values.
    fn set_bytes(&mut self, _value: Vec<u8>) -> Result<(), SinkError> {
        Err(unsupported("set_bytes", self.type_name()))
    }

    fn set_string(&mut self, _value: String) -> Result<(), SinkError> {
        Err(unsupported("set_string", self.type_name()))
    }

    /// The sink for record field `index`, or for union branch `index`.
    fn field(&mut self, _index: usize) -> Result<&mut dyn Sink, SinkError> {
        Err(unsupported("field", self.type_name()))
    }

    /// Populate record field `index` with its declared default.
    fn set_default(&mut self, _index: usize) -> Result<(), SinkError> {
        Err(unsupported("set_default", self.type_name()))
    }

    /// Grow an array by one element and return the element's sink.
    fn append_array(&mut self) -> Result<&mut dyn Sink, SinkError> {
        Err(unsupported("append_array", self.type_name()))
    }

    /// Insert `key` into a map and return the entry's sink.
    fn append_map(&mut self, _key: String) -> Result<&mut dyn Sink, SinkError> {
        Err(unsupported("append_map", self.type_name()))
    }

    /// Called once a nested sink has received everything it will get.
    fn finalize(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

pub fn unsupported(operation: &'static str, target: &'static str) -> SinkError {
    SinkError::Unsupported { operation, target }
}
