//! [`Sink`] for plain Rust values, so decoded data can land directly in
//! hand-written structs.

use std::collections::{BTreeMap, HashMap as StdHashMap};

use crate::{Sink, SinkError};

macro_rules! scalar_sink {
    ($ty:ty, $method:ident, $name:literal) => {
        impl Sink for $ty {
            fn type_name(&self) -> &'static str {
                $name
            }

            fn $method(&mut self, value: $ty) -> Result<(), SinkError> {
                *self = value;
                Ok(())
            }
        }
    };
}

scalar_sink!(bool, set_boolean, "boolean");
scalar_sink!(i32, set_int, "int");
scalar_sink!(i64, set_long, "long");
scalar_sink!(f32, set_float, "float");
scalar_sink!(f64, set_double, "double");
scalar_sink!(String, set_string, "string");

impl Sink for Vec<u8> {
    fn type_name(&self) -> &'static str {
        "bytes"
    }

    fn set_bytes(&mut self, value: Vec<u8>) -> Result<(), SinkError> {
        *self = value;
        Ok(())
    }
}

/// A fixed of size `N`.
impl<const N: usize> Sink for [u8; N] {
    fn type_name(&self) -> &'static str {
        "fixed"
    }

    fn set_bytes(&mut self, value: Vec<u8>) -> Result<(), SinkError> {
        if value.len() != N {
            return Err(SinkError::FixedSize {
                expected: N,
                actual: value.len(),
            });
        }
        self.copy_from_slice(&value);
        Ok(())
    }
}

impl<T: Sink + Default> Sink for Vec<T> {
    fn type_name(&self) -> &'static str {
        "array"
    }

    fn append_array(&mut self) -> Result<&mut dyn Sink, SinkError> {
        self.push(T::default());
        let last = self.len() - 1;
        Ok(&mut self[last])
    }
}

// Avro maps may repeat a key; the last occurrence wins.
macro_rules! map_sink {
    ($map:ident) => {
        impl<T: Sink + Default> Sink for $map<String, T> {
            fn type_name(&self) -> &'static str {
                "map"
            }

            fn append_map(&mut self, key: String) -> Result<&mut dyn Sink, SinkError> {
                let entry = self.entry(key).or_default();
                *entry = T::default();
                Ok(entry)
            }
        }
    };
}

map_sink!(StdHashMap);
map_sink!(BTreeMap);

type HashbrownMap<K, V> = hashbrown::HashMap<K, V>;
map_sink!(HashbrownMap);

#[cfg(test)]
#[path = "primitives_test.rs"]
mod primitives_test;
