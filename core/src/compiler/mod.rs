//! Schema resolution compiler.
//!
//! [`compile`] turns a writer/reader schema pair into a linked
//! [`Program`](crate::vm::Program).

mod assembler;
mod error;
mod ir;

pub use assembler::compile;
pub use error::CompileError;
