//! Service-local error types

use errors::AdaptorError;
use thiserror::Error;

/// Reasons an inbound event cannot be turned into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("missing field: data.{0}")]
    MissingField(String),

    #[error("data.{field} must be a string or integer, got {actual}")]
    TypeMismatch { field: String, actual: &'static str },
}

impl From<NormalizeError> for AdaptorError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::MissingField(field) => AdaptorError::MissingField(format!("data.{field}")),
            NormalizeError::TypeMismatch { field, actual } => AdaptorError::TypeMismatch {
                field: format!("data.{field}"),
                expected: "string or integer".to_string(),
                actual: actual.to_string(),
            },
        }
    }
}
