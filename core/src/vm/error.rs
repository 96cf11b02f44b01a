use core::fmt;

use avrokit_values::SinkError;
use ecow::EcoString;
use thiserror::Error;

use crate::codec::DecodeError;

/// A failed evaluation, tagged with where in the program it happened.
#[derive(Debug)]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    /// Program counter of the failing instruction.
    pub pc: usize,
    /// Label of the failing instruction.
    pub label: EcoString,
}

#[derive(Debug, Error)]
pub enum ExecutionErrorKind {
    /// The input is malformed or ended early.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The sink rejected an operation.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The data uses a part of the writer schema the reader cannot represent,
    /// e.g. a union branch or enum symbol the reader lacks.
    #[error("{0}")]
    Halt(EcoString),

    #[error("nesting depth {depth} exceeds the limit of {limit}")]
    ResourceExceeded { depth: usize, limit: usize },

    /// The program itself is malformed. Never caused by input data.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Defects in a program, as opposed to problems with the data it decodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("invalid operand {operand} for `{op}`")]
    InvalidOperand { op: &'static str, operand: i64 },

    #[error("program counter {0} is outside the program")]
    ProgramCounterOutOfRange(usize),

    #[error("halt refers to missing error message {0}")]
    UnknownMessage(i64),

    #[error("malformed program: {0}")]
    Malformed(String),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at pc {}: {})", self.kind, self.pc, self.label)
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}
