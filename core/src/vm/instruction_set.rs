use core::fmt;

use ecow::EcoString;

/// VM operations.
///
/// The discriminant is the opcode byte used when a program is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Decode one primitive of kind `operand` into its register.
    Read = 0,
    /// Deliver the register of kind `operand` to the current sink.
    Set = 1,
    /// Populate field `operand` of the current sink with its default.
    SetDefault = 2,
    /// Evaluate the following instructions against field/branch `operand`
    /// of the current sink, up to the matching `Exit`.
    Enter = 3,
    /// Finalize the current sink and return to the enclosing evaluation.
    Exit = 4,
    /// Grow the current array and evaluate the element up to its `Exit`.
    AppendArray = 5,
    /// Insert the string register as a key and evaluate the entry up to its `Exit`.
    AppendMap = 6,
    Call = 7,
    Return = 8,
    Jump = 9,
    CondJump = 10,
    EvalEqual = 11,
    EvalGreater = 12,
    AddLong = 13,
    MultLong = 14,
    /// Save the loop counter and evaluate one iteration up to `PopLoop`.
    PushLoop = 15,
    PopLoop = 16,
    /// Stop; a non-zero operand is a 1-based index into the error table.
    Halt = 17,
}

impl Opcode {
    pub const ALL: [Opcode; 18] = [
        Opcode::Read,
        Opcode::Set,
        Opcode::SetDefault,
        Opcode::Enter,
        Opcode::Exit,
        Opcode::AppendArray,
        Opcode::AppendMap,
        Opcode::Call,
        Opcode::Return,
        Opcode::Jump,
        Opcode::CondJump,
        Opcode::EvalEqual,
        Opcode::EvalGreater,
        Opcode::AddLong,
        Opcode::MultLong,
        Opcode::PushLoop,
        Opcode::PopLoop,
        Opcode::Halt,
    ];

    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Self::ALL.get(byte as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Read => "read",
            Opcode::Set => "set",
            Opcode::SetDefault => "set_default",
            Opcode::Enter => "enter",
            Opcode::Exit => "exit",
            Opcode::AppendArray => "append_array",
            Opcode::AppendMap => "append_map",
            Opcode::Call => "call",
            Opcode::Return => "return",
            Opcode::Jump => "jump",
            Opcode::CondJump => "cond_jump",
            Opcode::EvalEqual => "eval_equal",
            Opcode::EvalGreater => "eval_greater",
            Opcode::AddLong => "add_long",
            Opcode::MultLong => "mult_long",
            Opcode::PushLoop => "push_loop",
            Opcode::PopLoop => "pop_loop",
            Opcode::Halt => "halt",
        }
    }

    /// Whether the operand means anything for this opcode.
    fn has_operand(self) -> bool {
        !matches!(
            self,
            Opcode::Exit
                | Opcode::AppendArray
                | Opcode::AppendMap
                | Opcode::Return
                | Opcode::PushLoop
                | Opcode::PopLoop
        )
    }
}

/// Operand of `Read` and `Set`: which register, and for `Read`, which
/// encoding to decode into it.
///
/// The promotion kinds decode the writer's encoding straight into the
/// reader's register, e.g. `IntAsDouble` reads an int into the double
/// register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    /// A long that is read and thrown away.
    UnusedLong,
    IntAsLong,
    IntAsFloat,
    IntAsDouble,
    LongAsFloat,
    LongAsDouble,
    FloatAsDouble,
    StringAsBytes,
    BytesAsString,
    /// `size` raw bytes into the bytes register.
    Fixed(usize),
}

const FIXED_BASE: i64 = 17;

impl Kind {
    const SIMPLE: [Kind; 17] = [
        Kind::Null,
        Kind::Boolean,
        Kind::Int,
        Kind::Long,
        Kind::Float,
        Kind::Double,
        Kind::Bytes,
        Kind::String,
        Kind::UnusedLong,
        Kind::IntAsLong,
        Kind::IntAsFloat,
        Kind::IntAsDouble,
        Kind::LongAsFloat,
        Kind::LongAsDouble,
        Kind::FloatAsDouble,
        Kind::StringAsBytes,
        Kind::BytesAsString,
    ];

    pub fn operand(self) -> i64 {
        match self {
            Kind::Fixed(size) => FIXED_BASE + size as i64,
            simple => Self::SIMPLE
                .iter()
                .position(|k| *k == simple)
                .map_or(-1, |i| i as i64),
        }
    }

    pub fn from_operand(operand: i64) -> Option<Kind> {
        if operand >= FIXED_BASE {
            return usize::try_from(operand - FIXED_BASE).ok().map(Kind::Fixed);
        }
        usize::try_from(operand)
            .ok()
            .and_then(|i| Self::SIMPLE.get(i).copied())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Int => "int",
            Kind::Long => "long",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Bytes => "bytes",
            Kind::String => "string",
            Kind::UnusedLong => "unused_long",
            Kind::IntAsLong => "int_as_long",
            Kind::IntAsFloat => "int_as_float",
            Kind::IntAsDouble => "int_as_double",
            Kind::LongAsFloat => "long_as_float",
            Kind::LongAsDouble => "long_as_double",
            Kind::FloatAsDouble => "float_as_double",
            Kind::StringAsBytes => "string_as_bytes",
            Kind::BytesAsString => "bytes_as_string",
            Kind::Fixed(size) => return write!(f, "fixed({size})"),
        };
        f.write_str(name)
    }
}

/// One linked instruction. The label is a human-readable note on what
/// emitted it, shown in disassembly and error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub operand: i64,
    pub label: EcoString,
}

impl Instruction {
    pub fn new(op: Opcode, operand: i64, label: impl Into<EcoString>) -> Self {
        Self {
            op,
            operand,
            label: label.into(),
        }
    }

    pub fn read(kind: Kind, label: impl Into<EcoString>) -> Self {
        Self::new(Opcode::Read, kind.operand(), label)
    }

    pub fn set(kind: Kind, label: impl Into<EcoString>) -> Self {
        Self::new(Opcode::Set, kind.operand(), label)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operand = match self.op {
            Opcode::Read | Opcode::Set => match Kind::from_operand(self.operand) {
                Some(kind) => kind.to_string(),
                None => format!("?{}", self.operand),
            },
            op if op.has_operand() => self.operand.to_string(),
            _ => String::new(),
        };
        let text = format!("{:<13}{:<16}", self.op.name(), operand);
        if self.label.is_empty() {
            f.write_str(text.trim_end())
        } else {
            write!(f, "{text}; {}", self.label)
        }
    }
}
