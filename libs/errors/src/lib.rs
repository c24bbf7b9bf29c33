//! Unified error handling for the adaptor services
//!
//! Every crate in the workspace reports failures through [`AdaptorError`].
//! Startup code propagates it out of `main`; request handlers turn it into an
//! HTTP response (with the `axum-support` feature).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// ErrorInfo - API error response type
// ============================================================================

/// Standard error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (HTTP status)
    pub code: u16,
    /// Error message
    pub message: String,
    /// Detailed error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Field-specific errors for validation
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub field_errors: HashMap<String, Vec<String>>,
}

impl ErrorInfo {
    /// Create a new ErrorInfo with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
            details: None,
            field_errors: HashMap::new(),
        }
    }

    /// Set the error code
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Add details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Add a field error
    pub fn add_field_error(mut self, field: impl Into<String>, error: impl Into<String>) -> Self {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(error.into());
        self
    }
}

/// Error envelope returned to HTTP callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
}

// ============================================================================
// AdaptorError - Main error type
// ============================================================================

/// Main error type for the adaptor services
#[derive(Debug, Error)]
pub enum AdaptorError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // ======================================
    // Lookup Source Errors
    // ======================================
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Invalid lookup source: {location}: {reason}")]
    InvalidSource { location: String, reason: String },

    // ======================================
    // Request Errors
    // ======================================
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Data type mismatch: {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    // ======================================
    // Downstream Errors
    // ======================================
    #[error("Downstream request failed: {endpoint}: {reason}")]
    DownstreamUnavailable { endpoint: String, reason: String },

    #[error("Downstream response invalid: {endpoint}: {reason}")]
    DownstreamResponse { endpoint: String, reason: String },

    #[error("Timeout waiting for response from {0}")]
    Timeout(String),

    // ======================================
    // Runtime Errors
    // ======================================
    #[error("Service startup failed: {0}")]
    StartupFailed(String),
}

/// Result type alias using AdaptorError
pub type AdaptorResult<T> = Result<T, AdaptorError>;

impl AdaptorError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::BadRequest(_) | Self::MissingField(_) | Self::TypeMismatch { .. } => 400,

            // 502 Bad Gateway
            Self::DownstreamUnavailable { .. } | Self::DownstreamResponse { .. } => 502,

            // 503 Service Unavailable
            Self::StartupFailed(_) => 503,

            // 504 Gateway Timeout
            Self::Timeout(_) => 504,

            // 500 Internal Server Error
            Self::Configuration(_)
            | Self::InvalidConfig { .. }
            | Self::MissingConfig(_)
            | Self::Database(_)
            | Self::Sqlite(_)
            | Self::InvalidSource { .. } => 500,
        }
    }

    /// Stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::MissingConfig(_) => "MISSING_CONFIG",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Sqlite(_) => "SQLITE_ERROR",
            Self::InvalidSource { .. } => "INVALID_SOURCE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::DownstreamUnavailable { .. } => "DOWNSTREAM_UNAVAILABLE",
            Self::DownstreamResponse { .. } => "DOWNSTREAM_RESPONSE",
            Self::Timeout(_) => "TIMEOUT",
            Self::StartupFailed(_) => "STARTUP_FAILED",
        }
    }

    /// Convert to API ErrorInfo for HTTP responses
    pub fn to_error_info(&self) -> ErrorInfo {
        let mut error_info = ErrorInfo::new(self.to_string()).with_code(self.status_code());

        match self {
            Self::MissingField(field) => {
                error_info = error_info.add_field_error(field, "missing");
            },
            Self::TypeMismatch {
                field, expected, ..
            } => {
                error_info = error_info.add_field_error(field, format!("expected {}", expected));
            },
            Self::InvalidConfig { field, reason } => {
                error_info = error_info.add_field_error(field, reason);
            },
            Self::DownstreamUnavailable { endpoint, .. }
            | Self::DownstreamResponse { endpoint, .. } => {
                error_info = error_info.with_details(format!("endpoint: {}", endpoint));
            },
            _ => {},
        }

        error_info
    }
}

// Conversion traits for common error types
impl From<figment::Error> for AdaptorError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<csv::Error> for AdaptorError {
    fn from(err: csv::Error) -> Self {
        let location = err
            .position()
            .map(|pos| format!("csv line {}", pos.line()))
            .unwrap_or_else(|| "csv".to_string());
        Self::InvalidSource {
            location,
            reason: err.to_string(),
        }
    }
}

// Helper macros for creating errors
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::AdaptorError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::AdaptorError::Configuration(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! bad_request {
    ($msg:expr) => {
        $crate::AdaptorError::BadRequest($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::AdaptorError::BadRequest(format!($fmt, $($arg)*))
    };
}

// ============================================================================
// Axum integration
// ============================================================================

#[cfg(feature = "axum-support")]
impl axum::response::IntoResponse for AdaptorError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_error_info(),
            }),
        )
            .into_response()
    }
}
