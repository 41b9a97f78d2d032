//! Payload schemas declared by the contract.
//!
//! A [`Schema`] describes the JSON shape of a response payload for one
//! status code of an operation. The response builder validates every
//! payload against its schema before it is written.
//!
//! # Example
//!
//! ```
//! use hostinfo_core::Schema;
//!
//! let schema = Schema::error_object();
//!
//! let valid = serde_json::json!({ "code": 500, "message": "boom" });
//! assert!(schema.validate(&valid).is_ok());
//!
//! let invalid = serde_json::json!({ "code": "500" });
//! assert!(schema.validate(&invalid).is_err());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The JSON shape of a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// A JSON string.
    String {
        /// Minimum length in bytes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        /// Maximum length in bytes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// A JSON number without a fractional part.
    Integer {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    /// Any JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A JSON array whose items all match `items`.
    Array {
        /// Schema for every item.
        items: Box<Schema>,
    },
    /// A JSON object.
    Object {
        /// Known properties and their schemas.
        #[serde(default)]
        properties: BTreeMap<String, Schema>,
        /// Names of properties that must be present and non-null.
        #[serde(default)]
        required: Vec<String>,
    },
    /// Accepts any value.
    Any,
}

impl Schema {
    /// Creates an unconstrained string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
        }
    }

    /// Creates an unconstrained integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::Number
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    /// Creates an object schema whose properties are all optional.
    ///
    /// Use [`Schema::with_required`] to mark properties as mandatory.
    #[must_use]
    pub fn object<'a>(properties: impl IntoIterator<Item = (&'a str, Schema)>) -> Self {
        Self::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            required: Vec::new(),
        }
    }

    /// Creates a schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// The standard error payload: `{"code": integer, "message": string}`.
    #[must_use]
    pub fn error_object() -> Self {
        Self::object([("code", Self::integer()), ("message", Self::string())])
            .with_required(["code", "message"])
    }

    /// Marks object properties as required. Has no effect on other schemas.
    #[must_use]
    pub fn with_required<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        match self {
            Self::Object {
                properties,
                mut required,
            } => {
                for name in names {
                    if !required.iter().any(|r| r == name) {
                        required.push(name.to_string());
                    }
                }
                Self::Object {
                    properties,
                    required,
                }
            }
            other => other,
        }
    }

    /// Sets the minimum length of a string schema.
    #[must_use]
    pub fn min_length(self, len: usize) -> Self {
        match self {
            Self::String { max_length, .. } => Self::String {
                min_length: Some(len),
                max_length,
            },
            other => other,
        }
    }

    /// Sets the maximum length of a string schema.
    #[must_use]
    pub fn max_length(self, len: usize) -> Self {
        match self {
            Self::String { min_length, .. } => Self::String {
                min_length,
                max_length: Some(len),
            },
            other => other,
        }
    }

    /// Validates a JSON value against this schema.
    ///
    /// # Example
    ///
    /// ```
    /// use hostinfo_core::Schema;
    ///
    /// let schema = Schema::string().min_length(1);
    /// assert!(schema.validate(&serde_json::json!("myhost")).is_ok());
    /// assert!(schema.validate(&serde_json::json!("")).is_err());
    /// assert!(schema.validate(&serde_json::json!(42)).is_err());
    /// ```
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        match self {
            Self::Any => Ok(()),

            Self::String {
                min_length,
                max_length,
            } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| SchemaViolation::type_mismatch(path, "string", value))?;

                if let Some(min) = min_length {
                    if s.len() < *min {
                        return Err(SchemaViolation::new(
                            path,
                            format!("string length {} is less than minimum {min}", s.len()),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if s.len() > *max {
                        return Err(SchemaViolation::new(
                            path,
                            format!("string length {} is greater than maximum {max}", s.len()),
                        ));
                    }
                }
                Ok(())
            }

            Self::Integer { minimum, maximum } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| SchemaViolation::type_mismatch(path, "integer", value))?;

                if let Some(min) = minimum {
                    if n < *min {
                        return Err(SchemaViolation::new(
                            path,
                            format!("value {n} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        return Err(SchemaViolation::new(
                            path,
                            format!("value {n} is greater than maximum {max}"),
                        ));
                    }
                }
                Ok(())
            }

            Self::Number => {
                if value.is_number() {
                    Ok(())
                } else {
                    Err(SchemaViolation::type_mismatch(path, "number", value))
                }
            }

            Self::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(SchemaViolation::type_mismatch(path, "boolean", value))
                }
            }

            Self::Array { items } => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| SchemaViolation::type_mismatch(path, "array", value))?;

                for (idx, item) in arr.iter().enumerate() {
                    items.validate_at(item, &format!("{path}[{idx}]"))?;
                }
                Ok(())
            }

            Self::Object {
                properties,
                required,
            } => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| SchemaViolation::type_mismatch(path, "object", value))?;

                for name in required {
                    match obj.get(name) {
                        None | Some(Value::Null) => {
                            return Err(SchemaViolation::new(
                                format!("{path}.{name}"),
                                format!("missing required property '{name}'"),
                            ));
                        }
                        Some(_) => {}
                    }
                }

                // Unknown properties are accepted.
                for (name, schema) in properties {
                    match obj.get(name) {
                        None | Some(Value::Null) => {}
                        Some(prop) => schema.validate_at(prop, &format!("{path}.{name}"))?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Returns a human-readable name for a JSON value type.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A payload that does not conform to its declared schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema violation at '{path}': {message}")]
pub struct SchemaViolation {
    /// JSON path of the offending value (e.g. `$.code`).
    pub path: String,
    /// What was wrong with it.
    pub message: String,
}

impl SchemaViolation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    fn type_mismatch(path: &str, expected: &str, actual: &Value) -> Self {
        Self::new(
            path,
            format!("expected {expected}, got {}", value_type_name(actual)),
        )
    }
}
