//! The linked, immutable form of a decoding program.

use core::fmt;

use ecow::EcoString;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{Instruction, InternalError, Opcode};

/// A flat instruction sequence with its subroutine table and error messages.
///
/// Built once by the assembler and never mutated afterwards, so a single
/// program can drive any number of concurrent evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    methods: HashMap<EcoString, usize>,
    errors: Vec<EcoString>,
}

#[derive(Serialize, Deserialize)]
struct StoredInstruction {
    op: u8,
    operand: i64,
    label: EcoString,
}

#[derive(Serialize, Deserialize)]
struct StoredProgram {
    instructions: Vec<StoredInstruction>,
    methods: Vec<(EcoString, usize)>,
    errors: Vec<EcoString>,
}

impl Program {
    pub(crate) fn new(
        instructions: Vec<Instruction>,
        methods: HashMap<EcoString, usize>,
        errors: Vec<EcoString>,
    ) -> Self {
        Self {
            instructions,
            methods,
            errors,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Absolute offset of the named subroutine.
    pub fn method(&self, name: &str) -> Option<usize> {
        self.methods.get(name).copied()
    }

    /// Subroutines ordered by offset.
    pub fn methods(&self) -> Vec<(&str, usize)> {
        let mut methods: Vec<_> = self
            .methods
            .iter()
            .map(|(name, &offset)| (name.as_str(), offset))
            .collect();
        methods.sort_by_key(|&(name, offset)| (offset, name));
        methods
    }

    pub fn errors(&self) -> &[EcoString] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, InternalError> {
        let stored = StoredProgram {
            instructions: self
                .instructions
                .iter()
                .map(|i| StoredInstruction {
                    op: i.op as u8,
                    operand: i.operand,
                    label: i.label.clone(),
                })
                .collect(),
            methods: self
                .methods()
                .into_iter()
                .map(|(name, offset)| (EcoString::from(name), offset))
                .collect(),
            errors: self.errors.clone(),
        };
        postcard::to_allocvec(&stored).map_err(|e| InternalError::Malformed(e.to_string()))
    }

    /// Load a program persisted with [`Program::to_bytes`].
    ///
    /// Opcodes are checked here, so an evaluation never meets one it does
    /// not know.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InternalError> {
        let stored: StoredProgram =
            postcard::from_bytes(bytes).map_err(|e| InternalError::Malformed(e.to_string()))?;

        let instructions = stored
            .instructions
            .into_iter()
            .map(|i| {
                let op = Opcode::from_byte(i.op).ok_or(InternalError::UnknownOpcode(i.op))?;
                Ok(Instruction::new(op, i.operand, i.label))
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        let len = instructions.len();
        if let Some((name, offset)) = stored.methods.iter().find(|(_, offset)| *offset >= len) {
            return Err(InternalError::Malformed(format!(
                "method `{name}` starts at {offset}, past the end of the program"
            )));
        }

        Ok(Self::new(
            instructions,
            stored.methods.into_iter().collect(),
            stored.errors,
        ))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods = self.methods();
        let mut next_method = methods.iter().peekable();
        writeln!(f, "main:")?;
        for (pc, instruction) in self.instructions.iter().enumerate() {
            while let Some((name, _)) = next_method.next_if(|(_, offset)| *offset == pc) {
                writeln!(f, "{name}:")?;
            }
            writeln!(f, "{pc:>4}  {instruction}")?;
        }
        for (i, message) in self.errors.iter().enumerate() {
            writeln!(f, "error {}: {message}", i + 1)?;
        }
        Ok(())
    }
}

// Evaluations share programs across threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Program>();
};
