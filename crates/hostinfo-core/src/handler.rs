//! Handler trait for request processing.
//!
//! A [`Handler`] receives a [`RequestContext`] and the [`BoundParams`] for
//! one matched operation and reports a [`HandlerResult`]. It never sees the
//! raw HTTP request and never chooses a status code for success.

use crate::{BoundParams, RequestContext};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

/// Outcome of a handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    /// The operation succeeded with this payload.
    Success(Value),
    /// The operation failed. `code` should be one of the operation's declared
    /// error statuses.
    Failure {
        /// Status code to answer with.
        code: u16,
        /// Human-readable description for the client.
        message: String,
    },
}

impl HandlerResult {
    /// Serializes `payload` into a success result.
    ///
    /// A payload that cannot be represented as JSON becomes a `500` failure.
    ///
    /// ```
    /// use hostinfo_core::HandlerResult;
    ///
    /// let result = HandlerResult::success(&"myhost");
    /// assert_eq!(result, HandlerResult::Success(serde_json::json!("myhost")));
    /// ```
    pub fn success<T: Serialize + ?Sized>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => Self::Success(value),
            Err(e) => Self::failure(500, format!("failed to serialize response: {e}")),
        }
    }

    /// Creates a failure result.
    #[must_use]
    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self::Failure {
            code,
            message: message.into(),
        }
    }

    /// Whether this is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A request handler bound to one contract operation.
///
/// The trait is object safe; the registry stores handlers as
/// `Arc<dyn Handler>`.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use hostinfo_core::{BoundParams, Handler, HandlerResult, RequestContext};
///
/// struct Greeting;
///
/// #[async_trait]
/// impl Handler for Greeting {
///     async fn handle(&self, _ctx: &RequestContext, _params: BoundParams) -> HandlerResult {
///         HandlerResult::success(&"hello")
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    async fn handle(&self, ctx: &RequestContext, params: BoundParams) -> HandlerResult;
}

/// A function-based handler wrapper.
///
/// Lets an async closure serve as a [`Handler`]. The closure receives owned
/// copies of the context and parameters.
///
/// ```
/// use hostinfo_core::{BoundParams, FnHandler, HandlerResult, RequestContext};
///
/// let handler = FnHandler::new(|_ctx: RequestContext, _params: BoundParams| async { HandlerResult::success(&"ok") });
/// # let _ = handler;
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Creates a new function-based handler.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext, BoundParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: &RequestContext, params: BoundParams) -> HandlerResult {
        (self.func)(ctx.clone(), params).await
    }
}
