use core::mem;
use std::io::Read;

use avrokit_values::Sink;

use super::{
    ExecutionError, ExecutionErrorKind, Instruction, InternalError, Kind, Opcode, Program,
};
use crate::codec;

/// Limits applied to a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum nesting of fields, elements and subroutine calls. Bounds the
    /// native stack when the data nests deeply, e.g. a long linked list.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

/// Registers of one evaluation frame. Each nested evaluation starts with a
/// fresh frame.
#[derive(Default)]
struct Frame {
    boolean: bool,
    int: i32,
    long: i64,
    float: f32,
    double: f64,
    bytes: Vec<u8>,
    string: String,
    condition: bool,
}

pub struct VM<'p, 'i, R: Read + ?Sized> {
    program: &'p Program,
    input: &'i mut R,
    options: EvalOptions,
}

/// Run `program` over `input`, delivering decoded values to `sink`.
pub fn eval<R: Read + ?Sized>(
    input: &mut R,
    program: &Program,
    sink: &mut dyn Sink,
) -> Result<(), ExecutionError> {
    VM::new(program, input).run(sink)
}

impl<'p, 'i, R: Read + ?Sized> VM<'p, 'i, R> {
    pub fn new(program: &'p Program, input: &'i mut R) -> Self {
        Self::with_options(program, input, EvalOptions::default())
    }

    pub fn with_options(program: &'p Program, input: &'i mut R, options: EvalOptions) -> Self {
        Self {
            program,
            input,
            options,
        }
    }

    pub fn run(&mut self, sink: &mut dyn Sink) -> Result<(), ExecutionError> {
        let mut pc = 0;
        self.eval_inner(sink, &mut pc, 0)
    }

    fn fail(&self, pc: usize, kind: impl Into<ExecutionErrorKind>) -> ExecutionError {
        let label = self
            .program
            .instructions()
            .get(pc)
            .map(|i| i.label.clone())
            .unwrap_or_default();
        ExecutionError {
            kind: kind.into(),
            pc,
            label,
        }
    }

    /// Evaluate from `*pc` until the instruction that closes this level:
    /// `Exit`, `Return`, `PopLoop` or `Halt`.
    ///
    /// `pc` is shared with every nested level, so on return it points at the
    /// closing instruction.
    fn eval_inner(
        &mut self,
        sink: &mut dyn Sink,
        pc: &mut usize,
        depth: usize,
    ) -> Result<(), ExecutionError> {
        if depth > self.options.max_depth {
            return Err(self.fail(
                *pc,
                ExecutionErrorKind::ResourceExceeded {
                    depth,
                    limit: self.options.max_depth,
                },
            ));
        }

        let program = self.program;
        let mut frame = Frame::default();
        loop {
            let Some(instruction) = program.instructions().get(*pc) else {
                return Err(self.fail(*pc, InternalError::ProgramCounterOutOfRange(*pc)));
            };
            tracing::trace!(pc = *pc, %instruction, "eval");

            let Instruction { op, operand, .. } = *instruction;
            match op {
                Opcode::Read => self.read(&mut frame, operand).map_err(|kind| self.fail(*pc, kind))?,
                Opcode::Set => Self::set(&mut frame, sink, operand).map_err(|kind| self.fail(*pc, kind))?,
                Opcode::SetDefault => {
                    let index = self.index(*pc, operand)?;
                    sink.set_default(index).map_err(|e| self.fail(*pc, e))?;
                }
                Opcode::Enter => {
                    let index = self.index(*pc, operand)?;
                    let child = sink.field(index).map_err(|e| self.fail(*pc, e))?;
                    *pc += 1;
                    self.eval_inner(child, pc, depth + 1)?;
                }
                Opcode::Exit => {
                    return sink.finalize().map_err(|e| self.fail(*pc, e));
                }
                Opcode::AppendArray => {
                    let child = sink.append_array().map_err(|e| self.fail(*pc, e))?;
                    *pc += 1;
                    self.eval_inner(child, pc, depth + 1)?;
                }
                Opcode::AppendMap => {
                    let key = mem::take(&mut frame.string);
                    let child = sink.append_map(key).map_err(|e| self.fail(*pc, e))?;
                    *pc += 1;
                    self.eval_inner(child, pc, depth + 1)?;
                }
                Opcode::Call => {
                    let caller = *pc;
                    *pc = self.index(*pc, operand)?;
                    self.eval_inner(sink, pc, depth + 1)?;
                    *pc = caller;
                }
                Opcode::Return | Opcode::PopLoop => return Ok(()),
                Opcode::Jump => {
                    *pc = self.index(*pc, operand)?;
                    continue;
                }
                Opcode::CondJump => {
                    if frame.condition {
                        *pc = self.index(*pc, operand)?;
                        continue;
                    }
                }
                Opcode::EvalEqual => frame.condition = frame.long == operand,
                Opcode::EvalGreater => frame.condition = frame.long > operand,
                Opcode::AddLong => frame.long = frame.long.wrapping_add(operand),
                Opcode::MultLong => frame.long = frame.long.wrapping_mul(operand),
                Opcode::PushLoop => {
                    let remaining = frame.long;
                    *pc += 1;
                    self.eval_inner(sink, pc, depth + 1)?;
                    frame.long = remaining;
                }
                Opcode::Halt => {
                    if operand == 0 {
                        return Ok(());
                    }
                    let message = usize::try_from(operand - 1)
                        .ok()
                        .and_then(|i| program.errors().get(i))
                        .ok_or_else(|| self.fail(*pc, InternalError::UnknownMessage(operand)))?;
                    return Err(self.fail(*pc, ExecutionErrorKind::Halt(message.clone())));
                }
            }
            *pc += 1;
        }
    }

    /// A non-negative operand used as an index or address.
    fn index(&self, pc: usize, operand: i64) -> Result<usize, ExecutionError> {
        usize::try_from(operand).map_err(|_| {
            let op = self.program.instructions()[pc].op.name();
            self.fail(pc, InternalError::InvalidOperand { op, operand })
        })
    }

    fn read(&mut self, frame: &mut Frame, operand: i64) -> Result<(), ExecutionErrorKind> {
        let kind = Kind::from_operand(operand).ok_or(InternalError::InvalidOperand {
            op: Opcode::Read.name(),
            operand,
        })?;
        let r = &mut *self.input;
        match kind {
            Kind::Null => {}
            Kind::Boolean => frame.boolean = codec::read_boolean(r)?,
            Kind::Int => frame.int = codec::read_int(r)?,
            Kind::Long => frame.long = codec::read_long(r)?,
            Kind::Float => frame.float = codec::read_float(r)?,
            Kind::Double => frame.double = codec::read_double(r)?,
            Kind::Bytes | Kind::StringAsBytes => frame.bytes = codec::read_bytes(r)?,
            Kind::String | Kind::BytesAsString => frame.string = codec::read_string(r)?,
            Kind::UnusedLong => {
                codec::read_long(r)?;
            }
            Kind::IntAsLong => frame.long = i64::from(codec::read_int(r)?),
            Kind::IntAsFloat => frame.float = codec::read_int(r)? as f32,
            Kind::IntAsDouble => frame.double = f64::from(codec::read_int(r)?),
            Kind::LongAsFloat => frame.float = codec::read_long(r)? as f32,
            Kind::LongAsDouble => frame.double = codec::read_long(r)? as f64,
            Kind::FloatAsDouble => frame.double = f64::from(codec::read_float(r)?),
            Kind::Fixed(size) => frame.bytes = codec::read_fixed(r, size)?,
        }
        Ok(())
    }

    fn set(frame: &mut Frame, sink: &mut dyn Sink, operand: i64) -> Result<(), ExecutionErrorKind> {
        let result = match Kind::from_operand(operand) {
            Some(Kind::Null) => Ok(()),
            Some(Kind::Boolean) => sink.set_boolean(frame.boolean),
            Some(Kind::Int) => sink.set_int(frame.int),
            Some(Kind::Long) => sink.set_long(frame.long),
            Some(Kind::Float) => sink.set_float(frame.float),
            Some(Kind::Double) => sink.set_double(frame.double),
            Some(Kind::Bytes) => sink.set_bytes(mem::take(&mut frame.bytes)),
            Some(Kind::String) => sink.set_string(mem::take(&mut frame.string)),
            _ => {
                return Err(InternalError::InvalidOperand {
                    op: Opcode::Set.name(),
                    operand,
                }
                .into());
            }
        };
        result.map_err(ExecutionErrorKind::from)
    }
}

#[cfg(test)]
#[path = "vm_test.rs"]
mod vm_test;
