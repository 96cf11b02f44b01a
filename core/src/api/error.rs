//! Public error types.
//!
//! Errors from the schema parser, the compiler and the VM are converted to
//! these at the API boundary. Compilation errors keep the schema text they
//! refer to, so they can be rendered with source snippets.

use core::{fmt, ops::Range};

use avrokit_types::SchemaError;

use crate::{
    compiler::CompileError,
    container::ContainerError,
    vm::{ExecutionError, ExecutionErrorKind},
};

#[derive(Debug)]
pub enum Error {
    /// Invalid API usage, or a defect in a program.
    Api(String),

    /// A schema could not be parsed, or a schema pair could not be compiled.
    Compilation {
        diagnostics: Vec<Diagnostic>,
        /// The schema text the diagnostics point into.
        source: String,
        filename: Option<String>,
    },

    /// Decoding failed: malformed input, a rejected value, or written data
    /// the reader schema cannot represent.
    Runtime {
        diagnostic: Diagnostic,
        source: String,
        filename: Option<String>,
    },

    /// Nesting deeper than the configured limit.
    ResourceExceeded(String),
}

impl Error {
    /// Attach a filename, e.g. the path a schema was loaded from.
    pub fn with_filename(self, filename: impl Into<String>) -> Self {
        let filename = Some(filename.into());
        match self {
            Error::Compilation {
                diagnostics,
                source,
                ..
            } => Error::Compilation {
                diagnostics,
                source,
                filename,
            },
            Error::Runtime {
                diagnostic, source, ..
            } => Error::Runtime {
                diagnostic,
                source,
                filename,
            },
            other => other,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Error::Compilation { filename, .. } | Error::Runtime { filename, .. } => {
                filename.as_deref()
            }
            _ => None,
        }
    }

    /// A schema parse error located in `source`.
    pub fn from_schema_error(err: &SchemaError, source: &str) -> Self {
        Error::Compilation {
            diagnostics: vec![Diagnostic::error(err.to_string(), err.span(source), "schema")],
            source: source.to_string(),
            filename: None,
        }
    }

    /// A compile error located in the reader schema's `source`.
    pub fn from_compile_error(err: &CompileError, source: &str) -> Self {
        Error::Compilation {
            diagnostics: vec![err.to_diagnostic(source)],
            source: source.to_string(),
            filename: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api(msg) => write!(f, "API error: {msg}"),
            Error::Compilation { diagnostics, .. } => {
                let errors = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                write!(f, "Compilation failed with {errors} error(s)")?;
                if let Some(first) = diagnostics.first() {
                    write!(f, ": {}", first.message)?;
                }
                Ok(())
            }
            Error::Runtime { diagnostic, .. } => write!(f, "Runtime error: {}", diagnostic.message),
            Error::ResourceExceeded(msg) => write!(f, "Resource limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// A message about a location in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Byte range in the schema source, when the problem can be located.
    pub span: Option<Range<usize>>,
    pub help: Vec<String>,
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Option<Range<usize>>, code: &str) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            help: Vec::new(),
            code: Some(code.to_string()),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

fn find_quoted(source: &str, needle: &str) -> Option<Range<usize>> {
    let quoted = format!("\"{needle}\"");
    source
        .find(&quoted)
        .map(|start| start + 1..start + 1 + needle.len())
}

impl CompileError {
    pub fn to_diagnostic(&self, source: &str) -> Diagnostic {
        let span = self.subject().and_then(|subject| find_quoted(source, subject));
        let code = match self {
            CompileError::Incompatible { .. } => "incompatible-types",
            CompileError::FixedSizeMismatch { .. } => "fixed-size",
            CompileError::NoReadableBranch { .. } => "no-readable-branch",
            CompileError::MissingDefault { .. } => "missing-default",
            CompileError::InvalidDefault { .. } => "invalid-default",
            CompileError::UnresolvedReference(_) => "unresolved-reference",
            CompileError::UnknownMethod(_) | CompileError::Internal(_) => "internal",
        };
        let diagnostic = Diagnostic::error(self.to_string(), span, code);
        match self {
            CompileError::Incompatible { .. } => diagnostic.with_help(
                "int reads as long, float or double; long as float or double; \
                 float as double; string and bytes as each other",
            ),
            CompileError::MissingDefault { .. } => {
                diagnostic.with_help("declare a \"default\" for the field in the reader schema")
            }
            _ => diagnostic,
        }
    }
}

impl ExecutionError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match &self.kind {
            ExecutionErrorKind::Decode(_) => "decode",
            ExecutionErrorKind::Sink(_) => "sink",
            ExecutionErrorKind::Halt(_) => "unreadable-data",
            ExecutionErrorKind::ResourceExceeded { .. } => "resource-exceeded",
            ExecutionErrorKind::Internal(_) => "internal",
        };
        Diagnostic::error(self.to_string(), None, code)
    }
}

// ============================================================================
// Conversion from internal errors
// ============================================================================

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::from_schema_error(&err, "")
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Error::from_compile_error(&err, "")
    }
}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Self {
        match &err.kind {
            ExecutionErrorKind::Decode(_)
            | ExecutionErrorKind::Sink(_)
            | ExecutionErrorKind::Halt(_) => Error::Runtime {
                diagnostic: err.to_diagnostic(),
                source: String::new(),
                filename: None,
            },
            ExecutionErrorKind::ResourceExceeded { .. } => Error::ResourceExceeded(err.to_string()),
            ExecutionErrorKind::Internal(e) => Error::Api(format!("Internal error: {e}")),
        }
    }
}

impl From<ContainerError> for Error {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::Schema(err) => err.into(),
            ContainerError::Compile(err) => err.into(),
            ContainerError::Execution(err) => err.into(),
            other => Error::Runtime {
                diagnostic: Diagnostic::error(other.to_string(), None, "container"),
                source: String::new(),
                filename: None,
            },
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
