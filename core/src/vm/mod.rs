mod error;
mod instruction_set;
mod program;
mod vm;

pub use error::{ExecutionError, ExecutionErrorKind, InternalError};
pub use instruction_set::{Instruction, Kind, Opcode};
pub use program::Program;
pub use vm::{EvalOptions, VM, eval};
