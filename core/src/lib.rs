//! Avro schema resolution compiled to bytecode.
//!
//! A writer/reader schema pair is compiled once into a [`vm::Program`]; the
//! [`vm::VM`] then runs that program over binary-encoded input, pushing the
//! decoded data into any [`avrokit_values::Sink`]. [`api::Engine`] ties the
//! two together with a program cache, and [`container`] reads and writes
//! object container files on top of it.

pub mod api;
pub mod codec;
pub mod compiler;
pub mod container;
pub mod encoder;
pub mod vm;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize a tracing subscriber writing to the test output.
    ///
    /// Defaults to DEBUG level; `RUST_LOG` overrides it.
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
