use avrokit_values::DefaultValueError;
use ecow::EcoString;
use thiserror::Error;

/// Why a writer/reader schema pair could not be compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("{context}: `{writer}` cannot be read as `{reader}`")]
    Incompatible {
        writer: String,
        reader: String,
        context: String,
    },

    #[error("fixed `{name}` is {writer} bytes when written but {reader} bytes when read")]
    FixedSizeMismatch {
        name: String,
        writer: usize,
        reader: usize,
    },

    #[error("no writer branch of `{writer}` can be read as `{reader}`")]
    NoReadableBranch { writer: String, reader: String },

    #[error("field `{field}` of `{record}` is not written and has no default")]
    MissingDefault { record: String, field: String },

    #[error("invalid default for field `{field}` of `{record}`: {source}")]
    InvalidDefault {
        record: String,
        field: String,
        #[source]
        source: DefaultValueError,
    },

    #[error("unresolved type reference `{0}`")]
    UnresolvedReference(String),

    #[error("call to unregistered method `{0}`")]
    UnknownMethod(EcoString),

    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    /// The schema name the error is about, used to point at it in the
    /// reader schema's source.
    pub fn subject(&self) -> Option<&str> {
        match self {
            CompileError::FixedSizeMismatch { name, .. } => name.rsplit('.').next(),
            CompileError::MissingDefault { field, .. }
            | CompileError::InvalidDefault { field, .. } => Some(field.as_str()),
            CompileError::UnresolvedReference(name) => Some(name.as_str()),
            _ => None,
        }
    }
}
