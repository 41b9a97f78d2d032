//! Error types for hostinfo.
//!
//! Two kinds of error live here:
//!
//! - [`ContractError`]: a contract document that cannot be loaded or that
//!   violates a structural rule. Always a startup-time failure.
//! - [`ErrorBody`]: the `{code, message}` object every error response carries
//!   on the wire.

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used for the fixed generic server-error response.
pub const GENERIC_SERVER_ERROR_MESSAGE: &str = "internal server error";

/// A contract that cannot be used to serve requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The contract document could not be parsed.
    #[error("failed to parse contract: {0}")]
    Parse(String),

    /// Two operations share the same identifier.
    #[error("duplicate operation id '{0}'")]
    DuplicateOperation(String),

    /// Two operations share the same method and path pattern.
    #[error("operations '{first}' and '{second}' both route {method} {path}")]
    DuplicateRoute {
        /// HTTP method of the clashing routes.
        method: Method,
        /// Path pattern of the clashing routes.
        path: String,
        /// The operation declared first.
        first: String,
        /// The operation declared second.
        second: String,
    },

    /// A path pattern is malformed.
    #[error("operation '{operation_id}' has invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending operation.
        operation_id: String,
        /// The declared path pattern.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A parameter name is declared twice for one operation.
    #[error("operation '{operation_id}' declares parameter '{name}' more than once")]
    DuplicateParameter {
        /// The offending operation.
        operation_id: String,
        /// The repeated parameter name.
        name: String,
    },

    /// A `{placeholder}` in the path has no matching path parameter, or a
    /// path parameter has no placeholder.
    #[error("operation '{operation_id}': path parameter '{name}' {reason}")]
    PathParameterMismatch {
        /// The offending operation.
        operation_id: String,
        /// The parameter or placeholder name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A response status code is not allowed where it is declared.
    #[error("operation '{operation_id}' declares invalid status {status}: {reason}")]
    InvalidStatus {
        /// The offending operation.
        operation_id: String,
        /// The declared status code.
        status: u16,
        /// What is wrong with it.
        reason: String,
    },
}

/// The error payload written for every non-success response.
///
/// ```
/// use hostinfo_core::ErrorBody;
///
/// let body = ErrorBody::new(500, "failed to retrieve hostname");
/// let json = serde_json::to_string(&body).unwrap();
/// assert_eq!(json, r#"{"code":500,"message":"failed to retrieve hostname"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Numeric status code, mirrored from the HTTP status.
    pub code: u16,
    /// Human-readable description.
    pub message: String,
}

impl ErrorBody {
    /// Creates an error body.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The fixed generic server-error body.
    #[must_use]
    pub fn generic_server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            GENERIC_SERVER_ERROR_MESSAGE,
        )
    }

    /// Serializes the body as JSON bytes.
    #[must_use]
    pub fn to_json_bytes(&self) -> Vec<u8> {
        // Two plain fields; serialization cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}
