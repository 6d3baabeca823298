//! Error types for sdpanel

use thiserror::Error;

use crate::control::ValidationError;

/// Main error type for sdpanel operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),

    #[error("{}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Parameter {key} is not {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer name already in use: {0}")]
    LayerExists(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Expected {expected} outputs, got {actual}")]
    OutputCountMismatch { expected: usize, actual: usize },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("No state was set before run")]
    MissingState,

    #[error("Background worker is gone")]
    WorkerGone,

    #[error("Algorithm panicked: {0}")]
    Panicked(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias for sdpanel operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_error() {
        let err = Error::Validation(vec![
            ValidationError::new("sigma", "Sigma", "Value for Sigma must be a number"),
            ValidationError::new("iter", "Iterations", "Value for Iterations must be an integer"),
        ]);
        let text = err.to_string();
        assert!(text.contains("Sigma must be a number"));
        assert!(text.contains("Iterations must be an integer"));
    }
}
