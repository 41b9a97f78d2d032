//! Contract types.
//!
//! A [`Contract`] is an immutable table of [`Operation`] records. Each
//! operation declares its route, its parameters and the payload schema for
//! every status code it may answer with. The dispatch pipeline never routes,
//! binds or serializes anything the contract does not describe.
//!
//! # Example
//!
//! ```
//! use hostinfo_core::contract::{Contract, Operation};
//! use hostinfo_core::Schema;
//! use http::Method;
//!
//! let contract = Contract::builder("hostinfo")
//!     .version("1.0.0")
//!     .operation(
//!         Operation::builder("getHostname")
//!             .method(Method::GET)
//!             .path("/hostname")
//!             .success(200, Schema::string())
//!             .error(500, Schema::error_object())
//!             .build(),
//!     )
//!     .build();
//!
//! assert!(contract.validate().is_ok());
//! assert!(contract.get_operation("getHostname").is_some());
//! ```

use crate::error::ContractError;
use crate::schema::Schema;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

fn default_version() -> String {
    "0.0.0".to_string()
}

/// The declarative description of every operation a service answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// The service name.
    name: String,
    /// The contract version.
    #[serde(default = "default_version")]
    version: String,
    /// Operations in declaration order.
    operations: Vec<Operation>,
    /// Operation lookup by id.
    #[serde(skip)]
    operation_index: HashMap<String, usize>,
}

impl Contract {
    /// Creates a new contract builder.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder::new(name)
    }

    /// Parses and validates a JSON contract document.
    ///
    /// # Example
    ///
    /// ```
    /// use hostinfo_core::Contract;
    ///
    /// let contract = Contract::from_json(r#"{
    ///     "name": "hostinfo",
    ///     "operations": [{
    ///         "operation_id": "getIP",
    ///         "method": "GET",
    ///         "path": "/ip",
    ///         "responses": {
    ///             "success": { "status": 200, "schema": { "type": "string" } }
    ///         }
    ///     }]
    /// }"#).unwrap();
    ///
    /// assert_eq!(contract.version(), "0.0.0");
    /// assert_eq!(contract.operations().len(), 1);
    /// ```
    pub fn from_json(text: &str) -> Result<Self, ContractError> {
        let mut contract: Self =
            serde_json::from_str(text).map_err(|e| ContractError::Parse(e.to_string()))?;
        contract.rebuild_index();
        contract.validate()?;
        Ok(contract)
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the contract version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns all operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Looks up an operation by its id.
    #[must_use]
    pub fn get_operation(&self, operation_id: &str) -> Option<&Operation> {
        self.operation_index
            .get(operation_id)
            .and_then(|&idx| self.operations.get(idx))
    }

    /// Returns the ids of all operations in declaration order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(Operation::operation_id)
    }

    /// Checks the structural rules every servable contract must satisfy.
    ///
    /// Operation ids and routes must be unique, path placeholders and path
    /// parameters must correspond one to one, and response statuses must be
    /// in the right classes.
    pub fn validate(&self) -> Result<(), ContractError> {
        let mut ids = HashSet::new();
        let mut routes: HashMap<(Method, String), &str> = HashMap::new();

        for op in &self.operations {
            if !ids.insert(op.operation_id()) {
                return Err(ContractError::DuplicateOperation(op.operation_id.clone()));
            }

            op.validate()?;

            let key = (op.method.clone(), op.route_shape());
            if let Some(first) = routes.insert(key, op.operation_id()) {
                return Err(ContractError::DuplicateRoute {
                    method: op.method.clone(),
                    path: op.path.clone(),
                    first: first.to_string(),
                    second: op.operation_id.clone(),
                });
            }
        }

        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.operation_index = self
            .operations
            .iter()
            .enumerate()
            .map(|(idx, op)| (op.operation_id.clone(), idx))
            .collect();
    }
}

/// Builder for [`Contract`].
#[derive(Debug)]
pub struct ContractBuilder {
    name: String,
    version: String,
    operations: Vec<Operation>,
}

impl ContractBuilder {
    /// Creates a new contract builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            operations: Vec::new(),
        }
    }

    /// Sets the contract version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds an operation.
    #[must_use]
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Builds the contract. Call [`Contract::validate`] before serving it.
    #[must_use]
    pub fn build(self) -> Contract {
        let mut contract = Contract {
            name: self.name,
            version: self.version,
            operations: self.operations,
            operation_index: HashMap::new(),
        };
        contract.rebuild_index();
        contract
    }
}

/// One route + method pair within a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Unique identifier (e.g. "getHostname").
    operation_id: String,
    /// HTTP method.
    #[serde(with = "http_method_serde")]
    method: Method,
    /// Path pattern with `{name}` placeholders.
    path: String,
    /// Parameter schema, in declaration order.
    #[serde(default)]
    parameters: Vec<ParamSpec>,
    /// Response schema per status code.
    responses: Responses,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Tags for grouping operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

impl Operation {
    /// Creates a new operation builder.
    #[must_use]
    pub fn builder(operation_id: impl Into<String>) -> OperationBuilder {
        OperationBuilder::new(operation_id)
    }

    /// Returns the operation id.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path pattern.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the declared parameters in order.
    #[must_use]
    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    /// Returns the response schema.
    #[must_use]
    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Splits the path pattern into segments, ignoring empty ones.
    pub fn path_segments(&self) -> impl Iterator<Item = PathSegment<'_>> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(PathSegment::parse)
    }

    /// Route identity with placeholder names erased, so `/a/{x}` and `/a/{y}`
    /// compare equal.
    fn route_shape(&self) -> String {
        let shape: Vec<&str> = self
            .path_segments()
            .map(|seg| match seg {
                PathSegment::Literal(lit) => lit,
                PathSegment::Placeholder(_) => "{}",
            })
            .collect();
        format!("/{}", shape.join("/"))
    }

    fn validate(&self) -> Result<(), ContractError> {
        let id = &self.operation_id;

        if !self.path.starts_with('/') {
            return Err(ContractError::InvalidPath {
                operation_id: id.clone(),
                path: self.path.clone(),
                reason: "must start with '/'".to_string(),
            });
        }

        let mut placeholders = HashSet::new();
        for segment in self.path.split('/').filter(|s| !s.is_empty()) {
            let opens = segment.contains('{');
            let closes = segment.contains('}');
            match PathSegment::parse(segment) {
                PathSegment::Placeholder(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                    if !placeholders.insert(name) {
                        return Err(ContractError::InvalidPath {
                            operation_id: id.clone(),
                            path: self.path.clone(),
                            reason: format!("placeholder '{name}' appears twice"),
                        });
                    }
                }
                PathSegment::Literal(_) if !opens && !closes => {}
                _ => {
                    return Err(ContractError::InvalidPath {
                        operation_id: id.clone(),
                        path: self.path.clone(),
                        reason: format!("malformed segment '{segment}'"),
                    });
                }
            }
        }

        let mut names = HashSet::new();
        for param in &self.parameters {
            if !names.insert(param.name()) {
                return Err(ContractError::DuplicateParameter {
                    operation_id: id.clone(),
                    name: param.name.clone(),
                });
            }

            if param.location() == ParamLocation::Path {
                if !placeholders.contains(param.name()) {
                    return Err(ContractError::PathParameterMismatch {
                        operation_id: id.clone(),
                        name: param.name.clone(),
                        reason: "has no placeholder in the path".to_string(),
                    });
                }
                if !param.is_required() {
                    return Err(ContractError::PathParameterMismatch {
                        operation_id: id.clone(),
                        name: param.name.clone(),
                        reason: "must be required".to_string(),
                    });
                }
            }
        }

        for placeholder in &placeholders {
            let declared = self
                .parameters
                .iter()
                .any(|p| p.location() == ParamLocation::Path && p.name() == *placeholder);
            if !declared {
                return Err(ContractError::PathParameterMismatch {
                    operation_id: id.clone(),
                    name: (*placeholder).to_string(),
                    reason: "is not declared as a path parameter".to_string(),
                });
            }
        }

        self.responses.validate(id)
    }
}

/// One segment of a path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    /// Must match the request segment exactly.
    Literal(&'a str),
    /// Captures the request segment under this name.
    Placeholder(&'a str),
}

impl<'a> PathSegment<'a> {
    fn parse(segment: &'a str) -> Self {
        match segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(name) => Self::Placeholder(name),
            None => Self::Literal(segment),
        }
    }
}

/// Builder for [`Operation`].
#[derive(Debug)]
pub struct OperationBuilder {
    operation_id: String,
    method: Method,
    path: String,
    parameters: Vec<ParamSpec>,
    responses: Responses,
    description: Option<String>,
    tags: Vec<String>,
}

impl OperationBuilder {
    /// Creates a builder for `GET /` answering `200` with any payload.
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            method: Method::GET,
            path: "/".to_string(),
            parameters: Vec::new(),
            responses: Responses::new(200, Schema::Any),
            description: None,
            tags: Vec::new(),
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the path pattern.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Sets the success status and payload schema.
    #[must_use]
    pub fn success(mut self, status: u16, schema: Schema) -> Self {
        self.responses.success = ResponseSpec { status, schema };
        self
    }

    /// Declares an error status and its payload schema.
    #[must_use]
    pub fn error(mut self, status: u16, schema: Schema) -> Self {
        self.responses.errors.insert(status, schema);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builds the operation.
    #[must_use]
    pub fn build(self) -> Operation {
        Operation {
            operation_id: self.operation_id,
            method: self.method,
            path: self.path,
            parameters: self.parameters,
            responses: self.responses,
            description: self.description,
            tags: self.tags,
        }
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// A `{placeholder}` segment of the path.
    Path,
    /// A query string key.
    Query,
    /// A request header.
    Header,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        })
    }
}

/// Primitive type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Any UTF-8 text.
    String,
    /// A signed 64-bit integer.
    Integer,
    /// A 64-bit float.
    Number,
    /// `true` or `false`.
    Boolean,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        })
    }
}

/// A named, typed parameter of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    name: String,
    #[serde(rename = "in")]
    location: ParamLocation,
    #[serde(rename = "type")]
    param_type: ParamType,
    #[serde(default)]
    required: bool,
}

impl ParamSpec {
    /// Creates an optional parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParamLocation, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            location,
            param_type,
            required: false,
        }
    }

    /// Creates a path parameter. Path parameters are always required.
    #[must_use]
    pub fn path(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, ParamLocation::Path, param_type).required()
    }

    /// Creates an optional query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, ParamLocation::Query, param_type)
    }

    /// Creates an optional header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, ParamLocation::Header, param_type)
    }

    /// Marks the parameter as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns where the parameter is read from.
    #[must_use]
    pub fn location(&self) -> ParamLocation {
        self.location
    }

    /// Returns the parameter's primitive type.
    #[must_use]
    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    /// Returns whether the parameter must be present.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// The designated success response of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    status: u16,
    schema: Schema,
}

impl ResponseSpec {
    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the payload schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Response schemas of an operation: one success response plus declared
/// error statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Responses {
    success: ResponseSpec,
    #[serde(default)]
    errors: BTreeMap<u16, Schema>,
}

impl Responses {
    /// Creates responses with the given success status and no error statuses.
    #[must_use]
    pub fn new(status: u16, schema: Schema) -> Self {
        Self {
            success: ResponseSpec { status, schema },
            errors: BTreeMap::new(),
        }
    }

    /// Returns the success response.
    #[must_use]
    pub fn success(&self) -> &ResponseSpec {
        &self.success
    }

    /// Returns the schema declared for an error status, if any.
    #[must_use]
    pub fn error_schema(&self, status: u16) -> Option<&Schema> {
        self.errors.get(&status)
    }

    /// Returns the declared error statuses in ascending order.
    pub fn error_statuses(&self) -> impl Iterator<Item = u16> + '_ {
        self.errors.keys().copied()
    }

    fn validate(&self, operation_id: &str) -> Result<(), ContractError> {
        let invalid = |status: u16, reason: &str| ContractError::InvalidStatus {
            operation_id: operation_id.to_string(),
            status,
            reason: reason.to_string(),
        };

        let ok = StatusCode::from_u16(self.success.status)
            .map_err(|_| invalid(self.success.status, "not an HTTP status code"))?;
        if !ok.is_success() {
            return Err(invalid(self.success.status, "success status must be 2xx"));
        }

        for &status in self.errors.keys() {
            let code = StatusCode::from_u16(status)
                .map_err(|_| invalid(status, "not an HTTP status code"))?;
            if !(code.is_client_error() || code.is_server_error()) {
                return Err(invalid(status, "error status must be 4xx or 5xx"));
            }
        }

        Ok(())
    }
}

/// Serde support for HTTP methods.
mod http_method_serde {
    use http::Method;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(method.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Method, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.to_ascii_uppercase()
            .parse()
            .map_err(serde::de::Error::custom)
    }
}
