//! Response construction.
//!
//! Every response leaving the server is built here, so the wire shape of
//! success and error payloads is decided in one place:
//!
//! - a handler success is written with the operation's success status after
//!   its payload has been checked against the success schema;
//! - a handler failure is written with its own status only when the
//!   operation declares that status, otherwise it degrades to the fixed
//!   generic server error;
//! - routing and binding failures get `404` and `400` bodies.
//!
//! All bodies are JSON and every response carries `x-request-id`.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Response, StatusCode};
use http_body_util::Full;

use hostinfo_core::{ErrorBody, HandlerResult, Operation, RequestId};
use hostinfo_extract::BindingError;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Header carrying the request id on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const APPLICATION_JSON: &str = "application/json";

/// Builds schema-conformant JSON responses for one request.
#[derive(Debug, Clone, Copy)]
pub struct ResponseBuilder {
    request_id: RequestId,
}

impl ResponseBuilder {
    /// Creates a builder stamping `request_id` on its responses.
    #[must_use]
    pub const fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }

    /// Converts a handler outcome into the response the contract allows.
    pub fn from_result(&self, operation: &Operation, result: HandlerResult) -> HttpResponse {
        match result {
            HandlerResult::Success(payload) => self.success(operation, &payload),
            HandlerResult::Failure { code, message } => self.failure(operation, code, message),
        }
    }

    fn success(&self, operation: &Operation, payload: &serde_json::Value) -> HttpResponse {
        let spec = operation.responses().success();

        if let Err(violation) = spec.schema().validate(payload) {
            tracing::error!(
                operation_id = operation.operation_id(),
                request_id = %self.request_id,
                path = %violation.path,
                error = %violation.message,
                "handler returned a payload that violates the success schema"
            );
            return self.generic_server_error();
        }

        let Ok(status) = StatusCode::from_u16(spec.status()) else {
            return self.generic_server_error();
        };

        match serde_json::to_vec(payload) {
            Ok(body) => self.json(status, body),
            Err(e) => {
                tracing::error!(
                    operation_id = operation.operation_id(),
                    error = %e,
                    "failed to serialize success payload"
                );
                self.generic_server_error()
            }
        }
    }

    fn failure(&self, operation: &Operation, code: u16, message: String) -> HttpResponse {
        let Some(schema) = operation.responses().error_schema(code) else {
            tracing::warn!(
                operation_id = operation.operation_id(),
                request_id = %self.request_id,
                code,
                "handler reported a failure code the contract does not declare"
            );
            return self.generic_server_error();
        };

        let body = ErrorBody::new(code, message);
        let conforms = serde_json::to_value(&body)
            .map_err(|e| e.to_string())
            .and_then(|value| schema.validate(&value).map_err(|v| v.to_string()));
        if let Err(reason) = conforms {
            tracing::error!(
                operation_id = operation.operation_id(),
                request_id = %self.request_id,
                code,
                error = %reason,
                "error payload violates the declared error schema"
            );
            return self.generic_server_error();
        }

        match StatusCode::from_u16(code) {
            Ok(status) => self.json(status, body.to_json_bytes()),
            Err(_) => self.generic_server_error(),
        }
    }

    /// `404` for a request no operation matches.
    pub fn not_found(&self, method: &Method, path: &str) -> HttpResponse {
        let body = ErrorBody::new(
            StatusCode::NOT_FOUND.as_u16(),
            format!("no operation matches {method} {path}"),
        );
        self.json(StatusCode::NOT_FOUND, body.to_json_bytes())
    }

    /// `400` naming the parameter that could not be bound.
    pub fn binding_failure(&self, error: &BindingError) -> HttpResponse {
        let status = error.status_code();
        let body = ErrorBody::new(status.as_u16(), error.message());
        self.json(status, body.to_json_bytes())
    }

    /// The fixed generic `500` response.
    pub fn generic_server_error(&self) -> HttpResponse {
        self.json(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::generic_server_error().to_json_bytes(),
        )
    }

    fn json(&self, status: StatusCode, body: Vec<u8>) -> HttpResponse {
        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        if let Ok(value) = HeaderValue::from_str(&self.request_id.to_string()) {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        response
    }
}
