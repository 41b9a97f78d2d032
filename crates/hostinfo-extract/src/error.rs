//! Binding error types.
//!
//! A [`BindingError`] names the parameter that could not be bound, where it
//! was read from and what went wrong. Its display text is what the client
//! sees in the `400` response body.

use hostinfo_core::{ParamLocation, ParamType};
use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// The category of a binding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingErrorKind {
    /// A required parameter was not supplied.
    Missing,
    /// The raw value does not parse as the declared type.
    InvalidType,
    /// The raw value could not be decoded at all.
    MalformedEncoding,
}

impl fmt::Display for BindingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing",
            Self::InvalidType => "invalid type",
            Self::MalformedEncoding => "malformed encoding",
        })
    }
}

/// A request that does not satisfy an operation's parameter schema.
///
/// # Example
///
/// ```
/// use hostinfo_core::ParamLocation;
/// use hostinfo_extract::{BindingError, BindingErrorKind};
/// use http::StatusCode;
///
/// let err = BindingError::missing(ParamLocation::Query, "limit");
/// assert_eq!(err.kind(), BindingErrorKind::Missing);
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert!(err.to_string().contains("limit"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BindingError {
    parameter: String,
    location: ParamLocation,
    kind: BindingErrorKind,
    message: String,
}

impl BindingError {
    /// Creates an error for a required parameter that was not supplied.
    #[must_use]
    pub fn missing(location: ParamLocation, parameter: impl Into<String>) -> Self {
        let parameter = parameter.into();
        Self {
            message: format!("missing required {location} parameter '{parameter}'"),
            parameter,
            location,
            kind: BindingErrorKind::Missing,
        }
    }

    /// Creates an error for a value that does not parse as `expected`.
    #[must_use]
    pub fn invalid_type(
        location: ParamLocation,
        parameter: impl Into<String>,
        expected: ParamType,
        raw: &str,
    ) -> Self {
        let parameter = parameter.into();
        Self {
            message: format!(
                "invalid {location} parameter '{parameter}': expected {expected}, got '{raw}'"
            ),
            parameter,
            location,
            kind: BindingErrorKind::InvalidType,
        }
    }

    /// Creates an error for a value that could not be decoded.
    #[must_use]
    pub fn malformed(
        location: ParamLocation,
        parameter: impl Into<String>,
        details: impl fmt::Display,
    ) -> Self {
        let parameter = parameter.into();
        Self {
            message: format!("malformed {location} parameter '{parameter}': {details}"),
            parameter,
            location,
            kind: BindingErrorKind::MalformedEncoding,
        }
    }

    /// Returns the offending parameter name.
    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Returns where the parameter was read from.
    #[must_use]
    pub const fn location(&self) -> ParamLocation {
        self.location
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> BindingErrorKind {
        self.kind
    }

    /// Returns the client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Every binding failure is the client's fault.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = BindingError::missing(ParamLocation::Path, "user_id");

        assert_eq!(err.location(), ParamLocation::Path);
        assert_eq!(err.parameter(), "user_id");
        assert_eq!(err.kind(), BindingErrorKind::Missing);
        assert_eq!(err.to_string(), "missing required path parameter 'user_id'");
    }

    #[test]
    fn test_invalid_type_error() {
        let err = BindingError::invalid_type(ParamLocation::Query, "limit", ParamType::Integer, "ten");

        assert_eq!(err.kind(), BindingErrorKind::InvalidType);
        assert_eq!(
            err.to_string(),
            "invalid query parameter 'limit': expected integer, got 'ten'"
        );
    }

    #[test]
    fn test_malformed_error() {
        let err = BindingError::malformed(ParamLocation::Header, "x-trace", "not visible ASCII");

        assert_eq!(err.kind(), BindingErrorKind::MalformedEncoding);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("x-trace"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(BindingErrorKind::Missing.to_string(), "missing");
        assert_eq!(BindingErrorKind::InvalidType.to_string(), "invalid type");
        assert_eq!(
            BindingErrorKind::MalformedEncoding.to_string(),
            "malformed encoding"
        );
    }
}
