use thiserror::Error;

/// A sink refused an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// The target does not represent the shape the operation needs, e.g.
    /// assigning a string to an integer.
    #[error("`{target}` does not support `{operation}`")]
    Unsupported {
        operation: &'static str,
        target: &'static str,
    },

    #[error("index {index} is out of range for `{target}`")]
    InvalidIndex { index: i64, target: &'static str },

    #[error("fixed value must be {expected} bytes, got {actual}")]
    FixedSize { expected: usize, actual: usize },

    /// A value was requested before every part of it was delivered.
    #[error("{0} was never populated")]
    Incomplete(String),

    #[error(transparent)]
    Default(#[from] DefaultValueError),

    /// Rejection raised by a hand-written sink.
    #[error("{0}")]
    Custom(String),
}

/// A JSON default does not fit the type it is declared for.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefaultValueError {
    #[error("default {json} is not a valid {expected}")]
    Mismatch { expected: String, json: String },

    #[error("default for record `{record}` has no value for field `{field}`")]
    MissingField { record: String, field: String },

    #[error("type `{0}` is not defined")]
    Unresolved(String),
}

impl DefaultValueError {
    pub(crate) fn mismatch(expected: impl Into<String>, json: &serde_json::Value) -> Self {
        DefaultValueError::Mismatch {
            expected: expected.into(),
            json: json.to_string(),
        }
    }
}
