//! Typed, validated request parameters.
//!
//! [`BoundParams`] is produced by the parameter binder for one request and
//! handed to the handler. Every declared parameter has an entry: optional
//! parameters that were not supplied are recorded as absent (`None`) rather
//! than left out.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Text.
    String(String),
    /// A signed integer.
    Integer(i64),
    /// A float.
    Number(f64),
    /// A boolean.
    Boolean(bool),
}

impl ParamValue {
    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a float. Integers are widened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts to a JSON value. Non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::Number((*n).into()),
            Self::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Parameters bound for one request, keyed by parameter name.
///
/// # Example
///
/// ```
/// use hostinfo_core::{BoundParams, ParamValue};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Query {
///     id: i64,
///     verbose: Option<bool>,
/// }
///
/// let mut params = BoundParams::new();
/// params.insert("id", ParamValue::Integer(7));
/// params.insert_absent("verbose");
///
/// let query: Query = params.deserialize().unwrap();
/// assert_eq!(query.id, 7);
/// assert_eq!(query.verbose, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    values: BTreeMap<String, Option<ParamValue>>,
}

impl BoundParams {
    /// Creates an empty set of parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a supplied parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), Some(value));
    }

    /// Records an optional parameter that was not supplied.
    pub fn insert_absent(&mut self, name: impl Into<String>) {
        self.values.insert(name.into(), None);
    }

    /// Returns the value of a supplied parameter.
    ///
    /// Returns `None` both for absent and for undeclared parameters; use
    /// [`BoundParams::contains`] to tell them apart.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// Whether the parameter is declared but was not supplied.
    #[must_use]
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(None))
    }

    /// Whether the parameter is declared for this operation.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of declared parameters, supplied or absent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the operation declares no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ParamValue>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Deserializes the parameters into a typed struct. Absent parameters are
    /// presented as `null`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    value.as_ref().map_or(Value::Null, ParamValue::to_json),
                )
            })
            .collect();
        Value::Object(map)
    }
}
