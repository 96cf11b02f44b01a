//! Walks a writer/reader type pair and emits the program that reads data of
//! the first as the second.
//!
//! Every record pair becomes a named method, registered before its body is
//! compiled, so a schema that refers back to itself emits a `Call` instead of
//! expanding forever. Methods are laid out after `main` in registration
//! order.

use avrokit_types::{
    AvroType, EnumDefinition, FixedDefinition, Primitive, QualifiedName, RecordDefinition,
    Resolved, Schema, is_exact_match, is_readable_by,
};
use avrokit_values::Value;
use ecow::{EcoString, eco_format};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use super::{
    CompileError,
    ir::{BlockId, BlockLayout, IrInstruction, Layout, SwitchId, SwitchLayout},
};
use crate::vm::{Instruction, Kind, Opcode, Program};

type Code = Vec<IrInstruction>;

/// Switch cases: writer tag, and the reader index it is rewritten to.
type Cases = SmallVec<[(usize, Option<usize>); 4]>;

/// Compile the program that decodes data written with `writer` into sinks
/// shaped like `reader`.
pub fn compile(writer: &Schema, reader: &Schema) -> Result<Program, CompileError> {
    let mut assembler = Assembler {
        writer,
        reader,
        methods: Vec::new(),
        registered: HashSet::new(),
        errors: Vec::new(),
        blocks: 0,
        switches: 0,
    };

    let mut main = Code::new();
    assembler.value(&mut main, writer.root(), reader.root(), &EcoString::from("root"))?;
    main.push(literal(Opcode::Halt, 0, &EcoString::from("end")));
    assembler.link(main)
}

struct Method {
    name: EcoString,
    code: Code,
}

struct Assembler<'a> {
    writer: &'a Schema,
    reader: &'a Schema,
    methods: Vec<Method>,
    registered: HashSet<EcoString>,
    errors: Vec<EcoString>,
    blocks: usize,
    switches: usize,
}

fn literal(op: Opcode, operand: i64, label: &EcoString) -> IrInstruction {
    IrInstruction::Literal(Instruction::new(op, operand, label.clone()))
}

fn read(kind: Kind, label: &EcoString) -> IrInstruction {
    IrInstruction::Literal(Instruction::read(kind, label.clone()))
}

fn set(kind: Kind, label: &EcoString) -> IrInstruction {
    IrInstruction::Literal(Instruction::set(kind, label.clone()))
}

fn kind(primitive: Primitive) -> Kind {
    match primitive {
        Primitive::Null => Kind::Null,
        Primitive::Boolean => Kind::Boolean,
        Primitive::Int => Kind::Int,
        Primitive::Long => Kind::Long,
        Primitive::Float => Kind::Float,
        Primitive::Double => Kind::Double,
        Primitive::Bytes => Kind::Bytes,
        Primitive::String => Kind::String,
    }
}

fn incompatible(writer: &AvroType, reader: &AvroType, context: &str) -> CompileError {
    CompileError::Incompatible {
        writer: writer.to_string(),
        reader: reader.to_string(),
        context: context.to_string(),
    }
}

fn unresolved(ty: &AvroType) -> CompileError {
    CompileError::UnresolvedReference(ty.to_string())
}

impl<'a> Assembler<'a> {
    fn value(
        &mut self,
        code: &mut Code,
        w: &'a AvroType,
        r: &'a AvroType,
        label: &EcoString,
    ) -> Result<(), CompileError> {
        let writer = self.writer.resolve(w).ok_or_else(|| unresolved(w))?;
        let reader = self.reader.resolve(r).ok_or_else(|| unresolved(r))?;
        tracing::trace!(writer = %w, reader = %r, %label, "resolving");

        match (writer, reader) {
            (Resolved::Union(branches), _) => self.writer_union(code, w, branches, r, reader, label),
            (_, Resolved::Union(branches)) => self.reader_union(code, w, r, branches, label),
            (Resolved::Primitive(wp), Resolved::Primitive(rp)) => {
                self.primitive(code, wp, rp, label)
            }
            (Resolved::Record(wd), Resolved::Record(rd)) if self.accepts(&rd.name, &wd.name) => {
                let name = eco_format!("record:{}->{}", wd.name, rd.name);
                self.method(code, name, |asm, body| asm.record_body(body, wd, rd))
            }
            (Resolved::Enum(we), Resolved::Enum(re)) if self.accepts(&re.name, &we.name) => {
                self.enumeration(code, we, re, label);
                Ok(())
            }
            (Resolved::Fixed(wf), Resolved::Fixed(rf)) if self.accepts(&rf.name, &wf.name) => {
                self.fixed(code, wf, rf, label)
            }
            (Resolved::Array(wi), Resolved::Array(ri)) => {
                let id = self.block(code, label);
                code.push(literal(Opcode::AppendArray, 0, label));
                self.value(code, wi, ri, &eco_format!("{label}[]"))?;
                code.push(literal(Opcode::Exit, 0, label));
                code.push(IrInstruction::BlockEnd {
                    id,
                    label: label.clone(),
                });
                Ok(())
            }
            (Resolved::Map(wv), Resolved::Map(rv)) => {
                let id = self.block(code, label);
                code.push(read(Kind::String, &eco_format!("{label} key")));
                code.push(literal(Opcode::AppendMap, 0, label));
                self.value(code, wv, rv, &eco_format!("{label}[]"))?;
                code.push(literal(Opcode::Exit, 0, label));
                code.push(IrInstruction::BlockEnd {
                    id,
                    label: label.clone(),
                });
                Ok(())
            }
            _ => Err(incompatible(w, r, label)),
        }
    }

    /// Decode `w` into field or branch `index` of the current sink.
    ///
    /// A `null` reader receives nothing, so it is never entered.
    fn enter(
        &mut self,
        code: &mut Code,
        w: &'a AvroType,
        r: &'a AvroType,
        index: usize,
        label: &EcoString,
    ) -> Result<(), CompileError> {
        if r.is_null() {
            return self.value(code, w, r, label);
        }
        code.push(literal(Opcode::Enter, index as i64, label));
        self.value(code, w, r, label)?;
        code.push(literal(Opcode::Exit, 0, label));
        Ok(())
    }

    /// Consume `w` without delivering anything.
    fn skip(&mut self, code: &mut Code, w: &'a AvroType, label: &EcoString) -> Result<(), CompileError> {
        match self.writer.resolve(w).ok_or_else(|| unresolved(w))? {
            Resolved::Primitive(primitive) => {
                let kind = match primitive {
                    Primitive::Null => return Ok(()),
                    Primitive::Long => Kind::UnusedLong,
                    // Skipped strings are not validated.
                    Primitive::String => Kind::Bytes,
                    other => kind(other),
                };
                code.push(read(kind, label));
            }
            Resolved::Union(branches) => {
                let cases = (0..branches.len()).map(|tag| (tag, None)).collect();
                let error = self.error(eco_format!("union tag out of range for `{w}`"));
                code.push(read(Kind::Long, label));
                let id = self.switch(code, &cases, error, label);
                for (tag, _) in cases {
                    code.push(IrInstruction::SwitchCase {
                        id,
                        tag,
                        reader_index: None,
                        label: label.clone(),
                    });
                    self.skip(code, &branches[tag], label)?;
                }
                code.push(IrInstruction::SwitchEnd(id));
            }
            Resolved::Record(wd) => {
                let name = eco_format!("record:{}->_", wd.name);
                self.method(code, name, |asm, body| {
                    for field in &wd.fields {
                        asm.skip(body, &field.ty, &eco_format!("{}.{}", wd.name.name, field.name))?;
                    }
                    Ok(())
                })?;
            }
            Resolved::Enum(_) => code.push(read(Kind::Int, label)),
            Resolved::Fixed(fixed) => code.push(read(Kind::Fixed(fixed.size), label)),
            Resolved::Array(items) => {
                let id = self.block(code, label);
                self.skip(code, items, &eco_format!("{label}[]"))?;
                code.push(IrInstruction::BlockEnd {
                    id,
                    label: label.clone(),
                });
            }
            Resolved::Map(values) => {
                let id = self.block(code, label);
                code.push(read(Kind::Bytes, &eco_format!("{label} key")));
                self.skip(code, values, &eco_format!("{label}[]"))?;
                code.push(IrInstruction::BlockEnd {
                    id,
                    label: label.clone(),
                });
            }
        }
        Ok(())
    }

    fn primitive(
        &mut self,
        code: &mut Code,
        w: Primitive,
        r: Primitive,
        label: &EcoString,
    ) -> Result<(), CompileError> {
        let read_kind = match (w, r) {
            (Primitive::Null, Primitive::Null) => return Ok(()),
            (w, r) if w == r => kind(w),
            (Primitive::Int, Primitive::Long) => Kind::IntAsLong,
            (Primitive::Int, Primitive::Float) => Kind::IntAsFloat,
            (Primitive::Int, Primitive::Double) => Kind::IntAsDouble,
            (Primitive::Long, Primitive::Float) => Kind::LongAsFloat,
            (Primitive::Long, Primitive::Double) => Kind::LongAsDouble,
            (Primitive::Float, Primitive::Double) => Kind::FloatAsDouble,
            (Primitive::String, Primitive::Bytes) => Kind::StringAsBytes,
            (Primitive::Bytes, Primitive::String) => Kind::BytesAsString,
            _ => {
                return Err(CompileError::Incompatible {
                    writer: w.to_string(),
                    reader: r.to_string(),
                    context: label.to_string(),
                });
            }
        };
        code.push(read(read_kind, label));
        code.push(set(kind(r), label));
        Ok(())
    }

    fn record_body(
        &mut self,
        body: &mut Code,
        wd: &'a RecordDefinition,
        rd: &'a RecordDefinition,
    ) -> Result<(), CompileError> {
        let mut written = vec![false; rd.fields.len()];
        for wf in &wd.fields {
            match rd.reader_field_for(wf) {
                Some((index, rf)) => {
                    written[index] = true;
                    let label = eco_format!("{}.{}", rd.name.name, rf.name);
                    self.enter(body, &wf.ty, &rf.ty, index, &label)?;
                }
                None => self.skip(body, &wf.ty, &eco_format!("{}.{}", wd.name.name, wf.name))?,
            }
        }

        for (index, rf) in rd.fields.iter().enumerate() {
            if written[index] {
                continue;
            }
            let Some(default) = &rf.default else {
                return Err(CompileError::MissingDefault {
                    record: rd.name.to_string(),
                    field: rf.name.clone(),
                });
            };
            Value::from_default(self.reader, &rf.ty, default).map_err(|source| {
                CompileError::InvalidDefault {
                    record: rd.name.to_string(),
                    field: rf.name.clone(),
                    source,
                }
            })?;
            let label = eco_format!("{}.{}", rd.name.name, rf.name);
            body.push(literal(Opcode::SetDefault, index as i64, &label));
        }
        Ok(())
    }

    /// A writer union: dispatch on the written tag.
    fn writer_union(
        &mut self,
        code: &mut Code,
        w: &'a AvroType,
        branches: &'a [AvroType],
        r: &'a AvroType,
        reader: Resolved<'a>,
        label: &EcoString,
    ) -> Result<(), CompileError> {
        let reader_branches = match reader {
            Resolved::Union(reader_branches) => Some(reader_branches),
            _ => None,
        };

        let mut cases = Cases::new();
        for (tag, branch) in branches.iter().enumerate() {
            match reader_branches {
                Some(reader_branches) => {
                    if let Some(index) = self.pick_branch(branch, reader_branches) {
                        cases.push((tag, Some(index)));
                    }
                }
                None => {
                    if is_readable_by(self.writer, branch, self.reader, r) {
                        cases.push((tag, None));
                    }
                }
            }
        }
        if cases.is_empty() {
            return Err(CompileError::NoReadableBranch {
                writer: w.to_string(),
                reader: r.to_string(),
            });
        }

        let error = self.error(eco_format!("written branch of `{w}` cannot be read as `{r}`"));
        code.push(read(Kind::Long, label));
        let id = self.switch(code, &cases, error, label);
        for (tag, reader_index) in cases {
            code.push(IrInstruction::SwitchCase {
                id,
                tag,
                reader_index,
                label: label.clone(),
            });
            match (reader_branches, reader_index) {
                (Some(reader_branches), Some(index)) => {
                    self.enter(code, &branches[tag], &reader_branches[index], index, label)?;
                }
                _ => self.value(code, &branches[tag], r, label)?,
            }
        }
        code.push(IrInstruction::SwitchEnd(id));
        Ok(())
    }

    /// A plain writer type read as a union: the branch is fixed at compile
    /// time.
    fn reader_union(
        &mut self,
        code: &mut Code,
        w: &'a AvroType,
        r: &'a AvroType,
        branches: &'a [AvroType],
        label: &EcoString,
    ) -> Result<(), CompileError> {
        let index = self
            .pick_branch(w, branches)
            .ok_or_else(|| incompatible(w, r, label))?;
        code.push(literal(Opcode::MultLong, 0, label));
        code.push(literal(Opcode::AddLong, index as i64, label));
        code.push(set(Kind::Long, label));
        self.enter(code, w, &branches[index], index, label)
    }

    /// The reader branch for data written as `w`: an exact match, else the
    /// first branch that can read it.
    fn pick_branch(&self, w: &AvroType, branches: &[AvroType]) -> Option<usize> {
        branches
            .iter()
            .position(|branch| is_exact_match(self.writer, w, self.reader, branch))
            .or_else(|| {
                branches
                    .iter()
                    .position(|branch| is_readable_by(self.writer, w, self.reader, branch))
            })
    }

    /// Writer ordinals are rewritten to reader ordinals. Symbols the reader
    /// lacks go to its default symbol, or halt when it has none.
    fn enumeration(
        &mut self,
        code: &mut Code,
        we: &'a EnumDefinition,
        re: &'a EnumDefinition,
        label: &EcoString,
    ) {
        let fallback = re.default.as_deref().and_then(|symbol| re.symbol_index(symbol));
        let cases: Cases = we
            .symbols
            .iter()
            .enumerate()
            .filter_map(|(tag, symbol)| {
                re.symbol_index(symbol)
                    .or(fallback)
                    .map(|index| (tag, Some(index)))
            })
            .collect();

        let error = self.error(eco_format!(
            "symbol of `{}` is not declared by `{}`",
            we.name,
            re.name
        ));
        code.push(read(Kind::IntAsLong, label));
        let id = self.switch(code, &cases, error, label);
        for (tag, reader_index) in cases {
            code.push(IrInstruction::SwitchCase {
                id,
                tag,
                reader_index,
                label: label.clone(),
            });
        }
        code.push(IrInstruction::SwitchEnd(id));
    }

    fn fixed(
        &mut self,
        code: &mut Code,
        wf: &FixedDefinition,
        rf: &FixedDefinition,
        label: &EcoString,
    ) -> Result<(), CompileError> {
        if wf.size != rf.size {
            return Err(CompileError::FixedSizeMismatch {
                name: rf.name.to_string(),
                writer: wf.size,
                reader: rf.size,
            });
        }
        code.push(read(Kind::Fixed(wf.size), label));
        code.push(set(Kind::Bytes, label));
        Ok(())
    }

    fn accepts(&self, reader: &QualifiedName, writer: &QualifiedName) -> bool {
        self.reader
            .definition(reader)
            .is_some_and(|definition| definition.accepts_name(writer))
    }

    /// Emit a call to `name`, compiling its body on first use.
    fn method(
        &mut self,
        code: &mut Code,
        name: EcoString,
        body: impl FnOnce(&mut Self, &mut Code) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        if self.registered.insert(name.clone()) {
            tracing::debug!(method = %name, "compiling method");
            let slot = self.methods.len();
            self.methods.push(Method {
                name: name.clone(),
                code: Code::new(),
            });
            let mut instructions = Code::new();
            body(self, &mut instructions)?;
            instructions.push(literal(Opcode::Return, 0, &name));
            self.methods[slot].code = instructions;
        }
        code.push(IrInstruction::MethodCall(name));
        Ok(())
    }

    fn block(&mut self, code: &mut Code, label: &EcoString) -> BlockId {
        let id = self.blocks;
        self.blocks += 1;
        code.push(IrInstruction::BlockStart {
            id,
            label: label.clone(),
        });
        id
    }

    fn switch(&mut self, code: &mut Code, cases: &Cases, error: i64, label: &EcoString) -> SwitchId {
        let id = self.switches;
        self.switches += 1;
        code.push(IrInstruction::SwitchStart {
            id,
            tags: cases.iter().map(|(tag, _)| *tag).collect(),
            error,
            label: label.clone(),
        });
        id
    }

    /// Register a runtime error message; returns its `Halt` operand.
    fn error(&mut self, message: EcoString) -> i64 {
        self.errors.push(message);
        self.errors.len() as i64
    }

    /// Lay out `main` followed by every method, then lower against the
    /// finished layout.
    fn link(self, main: Code) -> Result<Program, CompileError> {
        let mut layout = Layout {
            methods: HashMap::new(),
            blocks: vec![BlockLayout::default(); self.blocks],
            switches: vec![SwitchLayout::default(); self.switches],
        };

        let units = || {
            core::iter::once((None, &main))
                .chain(self.methods.iter().map(|m| (Some(&m.name), &m.code)))
        };

        let mut offset = 0;
        for (name, code) in units() {
            if let Some(name) = name {
                layout.methods.insert(name.clone(), offset);
            }
            for instruction in code {
                match instruction {
                    IrInstruction::BlockStart { id, .. } => layout.blocks[*id].start = offset,
                    IrInstruction::BlockEnd { id, .. } => layout.blocks[*id].end = offset,
                    IrInstruction::SwitchCase { id, tag, .. } => {
                        layout.switches[*id].cases.push((*tag, offset));
                    }
                    IrInstruction::SwitchEnd(id) => layout.switches[*id].end = offset,
                    _ => {}
                }
                offset += instruction.len();
            }
        }

        let mut instructions = Vec::with_capacity(offset);
        for (_, code) in units() {
            for instruction in code {
                instructions.extend(instruction.lower(&layout)?);
            }
        }

        tracing::debug!(
            instructions = instructions.len(),
            methods = self.methods.len(),
            errors = self.errors.len(),
            "linked program"
        );
        Ok(Program::new(instructions, layout.methods, self.errors))
    }
}

#[cfg(test)]
#[path = "assembler_test.rs"]
mod assembler_test;
