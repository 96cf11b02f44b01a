use thiserror::Error;

use crate::QualifiedName;

/// Errors raised while parsing a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema JSON at line {line}, column {column}: {message}")]
    Json {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("invalid schema: {0}")]
    Invalid(String),

    #[error("missing attribute `{attribute}` in {context}")]
    MissingAttribute {
        attribute: &'static str,
        context: String,
    },

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("type `{0}` is defined more than once")]
    DuplicateDefinition(QualifiedName),

    #[error("unable to resolve definition of type `{0}`")]
    UnresolvedReference(QualifiedName),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Json {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

impl SchemaError {
    /// The schema text this error points at, if it can be located.
    ///
    /// JSON syntax errors carry a line and column; unresolved names are
    /// located by their first quoted occurrence in `source`.
    pub fn span(&self, source: &str) -> Option<core::ops::Range<usize>> {
        match self {
            SchemaError::Json { line, column, .. } => {
                let line_start: usize = source
                    .split_inclusive('\n')
                    .take(line.saturating_sub(1))
                    .map(str::len)
                    .sum();
                let offset = (line_start + column.saturating_sub(1)).min(source.len());
                Some(offset..(offset + 1).min(source.len()).max(offset))
            }
            SchemaError::UnknownType(name) => find_quoted(source, name),
            SchemaError::UnresolvedReference(name) => find_quoted(source, &name.to_string())
                .or_else(|| find_quoted(source, &name.name)),
            SchemaError::DuplicateDefinition(name) => find_quoted(source, &name.name),
            _ => None,
        }
    }
}

fn find_quoted(source: &str, needle: &str) -> Option<core::ops::Range<usize>> {
    let quoted = format!("\"{needle}\"");
    source
        .find(&quoted)
        .map(|start| start + 1..start + 1 + needle.len())
}
