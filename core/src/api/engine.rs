//! The decoding engine: compiles schema pairs once and runs the programs.

use std::{
    io::Read,
    sync::{Arc, PoisonError, RwLock},
};

use avrokit_types::Schema;
use avrokit_values::{Sink, Value, ValueSink};
use hashbrown::HashMap;

use super::{Diagnostic, EngineOptions, Error};
use crate::{
    compiler,
    vm::{Program, VM},
};

/// Cache key: the writer's canonical form and the reader's full text.
///
/// Writer aliases, docs and defaults never change how data is read, but the
/// reader's do, so the reader is keyed by its source rather than its
/// canonical form.
type ProgramKey = (String, String);

/// Compiles and runs decoding programs.
///
/// Programs are immutable once linked and shared through [`Arc`], so one
/// engine can serve decode calls from many threads at once.
///
/// # Example
///
/// ```
/// use avrokit_core::api::{Engine, EngineOptions};
///
/// let engine = Engine::new(EngineOptions::default());
/// let schema = engine.parse_schema(r#"["null", "string"]"#).unwrap();
/// let program = engine.compile(&schema, &schema).unwrap();
///
/// let again = engine.compile(&schema, &schema).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&program, &again));
/// assert_eq!(engine.cached_programs(), 1);
/// ```
pub struct Engine {
    options: EngineOptions,
    cache: RwLock<HashMap<ProgramKey, Arc<Program>>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse a schema document. Errors point into `json`.
    pub fn parse_schema(&self, json: &str) -> Result<Schema, Error> {
        Schema::parse(json).map_err(|err| Error::from_schema_error(&err, json))
    }

    /// The program reading data written with `writer` as `reader`.
    pub fn compile(&self, writer: &Schema, reader: &Schema) -> Result<Arc<Program>, Error> {
        if !self.options.cache_programs {
            return Ok(Arc::new(self.link(writer, reader)?));
        }

        let key = (writer.canonical_form(), reader.source().to_string());
        if let Some(program) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            tracing::trace!("program cache hit");
            return Ok(Arc::clone(program));
        }

        // Compiled outside the lock; a racing thread may compile the same
        // pair, and the first one stored wins.
        let program = Arc::new(self.link(writer, reader)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key).or_insert(program)))
    }

    fn link(&self, writer: &Schema, reader: &Schema) -> Result<Program, Error> {
        compiler::compile(writer, reader).map_err(|err| Error::from_compile_error(&err, reader.source()))
    }

    /// Number of programs held by the cache.
    pub fn cached_programs(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Decode one datum from `input` into `sink`.
    pub fn decode<R: Read + ?Sized>(
        &self,
        program: &Program,
        input: &mut R,
        sink: &mut dyn Sink,
    ) -> Result<(), Error> {
        VM::with_options(program, input, self.options.eval).run(sink)?;
        Ok(())
    }

    /// Decode one datum written with `writer` into a [`Value`] of `reader`.
    pub fn decode_value<R: Read + ?Sized>(
        &self,
        writer: &Schema,
        reader: &Schema,
        input: &mut R,
    ) -> Result<Value, Error> {
        let program = self.compile(writer, reader)?;
        let mut sink = ValueSink::new(reader);
        self.decode(&program, input, &mut sink)?;
        sink.into_value().map_err(|err| Error::Runtime {
            diagnostic: Diagnostic::error(err.to_string(), None, "sink"),
            source: String::new(),
            filename: None,
        })
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
