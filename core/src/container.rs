//! Object container files.
//!
//! A file is a header (magic, metadata, sync marker) followed by blocks of
//! records. Each block is a record count, its size in bytes, the records,
//! and the sync marker again. The header is itself an Avro record and is
//! decoded by the VM like any other; every record of the file is then
//! decoded with one shared program.

use std::{
    collections::BTreeMap,
    io::{self, BufRead, BufReader, Read, Write},
    sync::Arc,
};

use avrokit_types::{Schema, SchemaError};
use avrokit_values::{Sink, SinkError, Value, ValueSink};
use thiserror::Error;

use crate::{
    codec::{self, DecodeError},
    compiler::{CompileError, compile},
    encoder::{EncodeError, encode},
    vm::{EvalOptions, ExecutionError, Program, VM},
};

pub const MAGIC: [u8; 4] = *b"Obj\x01";
pub const SCHEMA_KEY: &str = "avro.schema";
pub const CODEC_KEY: &str = "avro.codec";

const HEADER_SCHEMA: &str = r#"{
  "type": "record", "name": "Header", "namespace": "org.apache.avro.file",
  "fields": [
    {"name": "magic", "type": {"type": "fixed", "name": "Magic", "size": 4}},
    {"name": "meta", "type": {"type": "map", "values": "bytes"}},
    {"name": "sync", "type": {"type": "fixed", "name": "Sync", "size": 16}}
  ]
}"#;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("not an object container file")]
    BadMagic,

    #[error("unsupported codec `{0}`")]
    UnsupportedCodec(String),

    #[error("header has no `{SCHEMA_KEY}` entry")]
    MissingSchema,

    #[error("sync marker mismatch after block {block}")]
    SyncMismatch { block: usize },

    #[error("invalid embedded schema: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The container header, filled in by the header program.
#[derive(Default)]
struct Header {
    magic: [u8; 4],
    meta: BTreeMap<String, Vec<u8>>,
    sync: [u8; 16],
}

impl Sink for Header {
    fn type_name(&self) -> &'static str {
        "org.apache.avro.file.Header"
    }

    fn field(&mut self, index: usize) -> Result<&mut dyn Sink, SinkError> {
        match index {
            0 => Ok(&mut self.magic),
            1 => Ok(&mut self.meta),
            2 => Ok(&mut self.sync),
            _ => Err(SinkError::InvalidIndex {
                index: index as i64,
                target: self.type_name(),
            }),
        }
    }
}

/// Reads records from a container file, resolving each against a reader
/// schema.
pub struct Reader<R> {
    input: BufReader<R>,
    writer_schema: Schema,
    reader_schema: Arc<Schema>,
    metadata: BTreeMap<String, Vec<u8>>,
    program: Program,
    options: EvalOptions,
    sync: [u8; 16],
    /// Records left in the current block.
    remaining: u64,
    blocks: usize,
    failed: bool,
}

impl<R: Read> Reader<R> {
    /// Read the header and compile the program from the embedded writer
    /// schema to `reader_schema`.
    pub fn new(input: R, reader_schema: &Schema) -> Result<Self, ContainerError> {
        Self::start(input, Some(reader_schema), EvalOptions::default())
    }

    /// Open a file reading records exactly as they were written.
    pub fn open(input: R) -> Result<Self, ContainerError> {
        Self::start(input, None, EvalOptions::default())
    }

    pub fn with_options(
        input: R,
        reader_schema: &Schema,
        options: EvalOptions,
    ) -> Result<Self, ContainerError> {
        Self::start(input, Some(reader_schema), options)
    }

    fn start(
        input: R,
        reader_schema: Option<&Schema>,
        options: EvalOptions,
    ) -> Result<Self, ContainerError> {
        let header_schema = Schema::parse(HEADER_SCHEMA)?;
        let header_program = compile(&header_schema, &header_schema)?;

        let mut input = BufReader::new(input);
        let mut header = Header::default();
        let decoded = VM::with_options(&header_program, &mut input, options).run(&mut header);
        if header.magic != MAGIC {
            return Err(ContainerError::BadMagic);
        }
        decoded?;

        let codec = header
            .meta
            .get(CODEC_KEY)
            .map_or("null", |codec| core::str::from_utf8(codec).unwrap_or("?"));
        if codec != "null" {
            return Err(ContainerError::UnsupportedCodec(codec.to_string()));
        }
        let schema = header
            .meta
            .get(SCHEMA_KEY)
            .ok_or(ContainerError::MissingSchema)?;
        let schema = core::str::from_utf8(schema).map_err(|_| DecodeError::InvalidUtf8)?;
        let writer_schema = Schema::parse(schema)?;
        let reader_schema = reader_schema.unwrap_or(&writer_schema).clone();
        let program = compile(&writer_schema, &reader_schema)?;

        tracing::debug!(
            writer = %writer_schema.canonical_form(),
            instructions = program.len(),
            "opened container"
        );
        Ok(Self {
            input,
            writer_schema,
            reader_schema: Arc::new(reader_schema),
            metadata: header.meta,
            program,
            options,
            sync: header.sync,
            remaining: 0,
            blocks: 0,
            failed: false,
        })
    }

    pub fn writer_schema(&self) -> &Schema {
        &self.writer_schema
    }

    pub fn reader_schema(&self) -> &Schema {
        &self.reader_schema
    }

    /// Header metadata, including the embedded schema and codec.
    pub fn metadata(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.metadata
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Decode the next record into `sink`. Returns `false` once the file is
    /// exhausted.
    pub fn read_into(&mut self, sink: &mut dyn Sink) -> Result<bool, ContainerError> {
        while self.remaining == 0 {
            if self.input.fill_buf()?.is_empty() {
                return Ok(false);
            }
            let count = codec::read_long(&mut self.input)?;
            let size = codec::read_long(&mut self.input)?;
            if count < 0 {
                return Err(DecodeError::NegativeLength(count).into());
            }
            self.blocks += 1;
            tracing::debug!(block = self.blocks, records = count, bytes = size, "reading block");
            self.remaining = count as u64;
            if count == 0 {
                self.check_sync()?;
            }
        }

        VM::with_options(&self.program, &mut self.input, self.options).run(sink)?;
        self.remaining -= 1;
        if self.remaining == 0 {
            self.check_sync()?;
        }
        Ok(true)
    }

    fn check_sync(&mut self) -> Result<(), ContainerError> {
        let mut sync = [0u8; 16];
        self.input.read_exact(&mut sync).map_err(DecodeError::from)?;
        if sync != self.sync {
            return Err(ContainerError::SyncMismatch { block: self.blocks });
        }
        Ok(())
    }
}

/// Decoded records as [`Value`]s of the reader schema. Iteration stops after
/// the first error.
impl<R: Read> Iterator for Reader<R> {
    type Item = Result<Value, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let schema = Arc::clone(&self.reader_schema);
        let mut sink = ValueSink::new(&schema);
        let result = match self.read_into(&mut sink) {
            Ok(false) => return None,
            Ok(true) => sink.into_value().map_err(ContainerError::from),
            Err(err) => Err(err),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Records buffered before a block is written.
    pub records_per_block: usize,
    /// Sync marker; a random one when `None`.
    pub sync: Option<[u8; 16]>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            records_per_block: 100,
            sync: None,
        }
    }
}

fn write_header<W: Write + ?Sized>(
    output: &mut W,
    schema: &Schema,
    sync: &[u8; 16],
) -> Result<(), ContainerError> {
    let header_schema = Schema::parse(HEADER_SCHEMA)?;
    let meta = BTreeMap::from([
        (CODEC_KEY.to_string(), Value::Bytes(b"null".to_vec())),
        (
            SCHEMA_KEY.to_string(),
            Value::Bytes(schema.source().as_bytes().to_vec()),
        ),
    ]);
    let header = Value::record([
        ("magic", Value::Fixed(MAGIC.to_vec())),
        ("meta", Value::Map(meta)),
        ("sync", Value::Fixed(sync.to_vec())),
    ]);
    encode(&header_schema, &header, output)?;
    Ok(())
}

/// Writes values of one schema into a container file.
///
/// Records are buffered until a block is full. Call [`Writer::flush`] or
/// [`Writer::into_inner`] before dropping the writer; records still
/// buffered on drop are discarded.
pub struct Writer<W: Write> {
    output: W,
    schema: Schema,
    sync: [u8; 16],
    options: WriterOptions,
    block: Vec<u8>,
    pending: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(output: W, schema: Schema) -> Result<Self, ContainerError> {
        Self::with_options(output, schema, WriterOptions::default())
    }

    /// Write the header immediately.
    pub fn with_options(
        mut output: W,
        schema: Schema,
        options: WriterOptions,
    ) -> Result<Self, ContainerError> {
        let sync = options.sync.unwrap_or_else(rand::random);
        write_header(&mut output, &schema, &sync)?;
        Ok(Self {
            output,
            schema,
            sync,
            options,
            block: Vec::new(),
            pending: 0,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Buffer one record. A value that fails to encode leaves the block
    /// as it was.
    pub fn append(&mut self, value: &Value) -> Result<(), ContainerError> {
        let mark = self.block.len();
        if let Err(err) = encode(&self.schema, value, &mut self.block) {
            self.block.truncate(mark);
            return Err(err.into());
        }
        self.pending += 1;
        if self.pending >= self.options.records_per_block.max(1) {
            self.write_block()?;
        }
        Ok(())
    }

    fn write_block(&mut self) -> Result<(), ContainerError> {
        if self.pending == 0 {
            return Ok(());
        }
        tracing::debug!(records = self.pending, bytes = self.block.len(), "writing block");
        codec::write_long(&mut self.output, self.pending as i64)?;
        codec::write_long(&mut self.output, self.block.len() as i64)?;
        self.output.write_all(&self.block)?;
        self.output.write_all(&self.sync)?;
        self.block.clear();
        self.pending = 0;
        Ok(())
    }

    /// Write any buffered records as a block and flush the output.
    pub fn flush(&mut self) -> Result<(), ContainerError> {
        self.write_block()?;
        self.output.flush()?;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W, ContainerError> {
        self.flush()?;
        Ok(self.output)
    }
}

#[cfg(test)]
#[path = "container_test.rs"]
mod container_test;
