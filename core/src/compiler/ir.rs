//! Instructions whose addresses are not known until the whole program is laid
//! out.
//!
//! The assembler emits [`IrInstruction`]s with symbolic block, switch and
//! method ids. Linking first measures every instruction with
//! [`IrInstruction::len`] to build a [`Layout`], then lowers each one against
//! the complete layout.

use ecow::EcoString;
use hashbrown::HashMap;
use smallvec::SmallVec;

use super::CompileError;
use crate::vm::{Instruction, Kind, Opcode};

pub(crate) type BlockId = usize;
pub(crate) type SwitchId = usize;

#[derive(Debug, Clone)]
pub(crate) enum IrInstruction {
    Literal(Instruction),
    /// `Call` to a registered method.
    MethodCall(EcoString),
    /// Decode a block header and enter the loop for one item.
    BlockStart { id: BlockId, label: EcoString },
    /// Close one item; read the next header once the block is exhausted.
    BlockEnd { id: BlockId, label: EcoString },
    /// Dispatch on the long register. Tags without a case halt with
    /// `error`.
    SwitchStart {
        id: SwitchId,
        tags: SmallVec<[usize; 4]>,
        error: i64,
        label: EcoString,
    },
    /// Entry for writer tag `tag`. With a reader index, the register is
    /// rewritten to it and delivered before the case body runs.
    SwitchCase {
        id: SwitchId,
        tag: usize,
        reader_index: Option<usize>,
        label: EcoString,
    },
    SwitchEnd(SwitchId),
}

#[derive(Debug, Default, Clone)]
pub(crate) struct BlockLayout {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct SwitchLayout {
    /// Offset of the case for each writer tag.
    pub cases: Vec<(usize, usize)>,
    pub end: usize,
}

/// Absolute offsets of every symbolic target.
#[derive(Debug, Default)]
pub(crate) struct Layout {
    pub methods: HashMap<EcoString, usize>,
    pub blocks: Vec<BlockLayout>,
    pub switches: Vec<SwitchLayout>,
}

fn op(op: Opcode, operand: i64, label: &EcoString) -> Instruction {
    Instruction::new(op, operand, label.clone())
}

fn address(offset: usize) -> i64 {
    offset as i64
}

/// Leaves a positive item count in the long register, or jumps to `exit` on
/// the terminating empty block. Jumps to `entry` past the byte count
/// handling when the count is already positive.
fn block_header(exit: usize, entry: usize, label: &EcoString) -> Vec<Instruction> {
    vec![
        Instruction::read(Kind::Long, label.clone()),
        op(Opcode::EvalEqual, 0, label),
        op(Opcode::CondJump, address(exit), label),
        op(Opcode::EvalGreater, 0, label),
        op(Opcode::CondJump, address(entry), label),
        Instruction::read(Kind::UnusedLong, label.clone()),
        op(Opcode::MultLong, -1, label),
    ]
}

fn block_footer(start: usize, entry: usize, label: &EcoString) -> Vec<Instruction> {
    vec![
        op(Opcode::PopLoop, 0, label),
        op(Opcode::AddLong, -1, label),
        op(Opcode::EvalEqual, 0, label),
        op(Opcode::CondJump, address(start), label),
        op(Opcode::Jump, address(entry), label),
    ]
}

fn header_len() -> usize {
    block_header(0, 0, &EcoString::new()).len()
}

fn footer_len() -> usize {
    block_footer(0, 0, &EcoString::new()).len()
}

impl IrInstruction {
    /// Number of instructions this lowers to.
    pub fn len(&self) -> usize {
        match self {
            IrInstruction::Literal(_) | IrInstruction::MethodCall(_) => 1,
            // The header plus `PushLoop`.
            IrInstruction::BlockStart { .. } => header_len() + 1,
            IrInstruction::BlockEnd { .. } => footer_len(),
            IrInstruction::SwitchStart { tags, .. } => 2 * tags.len() + 1,
            IrInstruction::SwitchCase { reader_index, .. } => {
                if reader_index.is_some() {
                    3
                } else {
                    1
                }
            }
            IrInstruction::SwitchEnd(_) => 0,
        }
    }

    pub fn lower(&self, layout: &Layout) -> Result<Vec<Instruction>, CompileError> {
        Ok(match self {
            IrInstruction::Literal(instruction) => vec![instruction.clone()],
            IrInstruction::MethodCall(name) => {
                let offset = layout
                    .methods
                    .get(name)
                    .ok_or_else(|| CompileError::UnknownMethod(name.clone()))?;
                vec![op(Opcode::Call, address(*offset), name)]
            }
            IrInstruction::BlockStart { id, label } => {
                let block = block(layout, *id)?;
                let entry = block.start + header_len();
                let mut code = block_header(block.end + footer_len(), entry, label);
                code.push(op(Opcode::PushLoop, 0, label));
                code
            }
            IrInstruction::BlockEnd { id, label } => {
                let block = block(layout, *id)?;
                block_footer(block.start, block.start + header_len(), label)
            }
            IrInstruction::SwitchStart {
                id,
                tags,
                error,
                label,
            } => {
                let switch = switch(layout, *id)?;
                let mut code = Vec::with_capacity(self.len());
                for &tag in tags {
                    let (_, case) = switch
                        .cases
                        .iter()
                        .find(|(t, _)| *t == tag)
                        .ok_or_else(|| unlinked("case", *id))?;
                    code.push(op(Opcode::EvalEqual, tag as i64, label));
                    // Past the case's leading jump.
                    code.push(op(Opcode::CondJump, address(case + 1), label));
                }
                code.push(op(Opcode::Halt, *error, label));
                code
            }
            IrInstruction::SwitchCase {
                id,
                tag,
                reader_index,
                label,
            } => {
                let switch = switch(layout, *id)?;
                let mut code = vec![op(Opcode::Jump, address(switch.end), label)];
                if let Some(reader_index) = reader_index {
                    code.push(op(
                        Opcode::AddLong,
                        *reader_index as i64 - *tag as i64,
                        label,
                    ));
                    code.push(Instruction::set(Kind::Long, label.clone()));
                }
                code
            }
            IrInstruction::SwitchEnd(_) => Vec::new(),
        })
    }
}

fn unlinked(what: &str, id: usize) -> CompileError {
    CompileError::Internal(format!("{what} {id} was never laid out"))
}

fn block(layout: &Layout, id: BlockId) -> Result<&BlockLayout, CompileError> {
    layout.blocks.get(id).ok_or_else(|| unlinked("block", id))
}

fn switch(layout: &Layout, id: SwitchId) -> Result<&SwitchLayout, CompileError> {
    layout.switches.get(id).ok_or_else(|| unlinked("switch", id))
}

#[cfg(test)]
#[path = "ir_test.rs"]
mod ir_test;
