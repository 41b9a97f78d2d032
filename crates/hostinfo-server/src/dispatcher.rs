//! Contract-driven request dispatch.
//!
//! The [`Dispatcher`] ties the pipeline together: it routes a request to an
//! operation, binds the operation's parameters, invokes the registered
//! handler exactly once and hands the outcome to the
//! [`ResponseBuilder`](crate::ResponseBuilder). Every outcome, including
//! "no such route" and "bad parameters", becomes a response.
//!
//! Construction checks the handler registry against the contract, so a
//! dispatcher that exists can serve every operation it routes to.

use std::sync::Arc;
use std::time::Duration;

use http::Request;
use thiserror::Error;

use hostinfo_core::{Contract, ContractError, RequestContext, RequestId};

use crate::handler::HandlerRegistry;
use crate::response::{HttpResponse, ResponseBuilder};
use crate::router::Router;

/// Per-request settings applied by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    request_deadline: Option<Duration>,
}

impl DispatcherConfig {
    /// Sets the advisory deadline attached to each request context.
    #[must_use]
    pub const fn with_request_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.request_deadline = deadline;
        self
    }

    /// Returns the advisory request deadline.
    #[must_use]
    pub const fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline
    }
}

/// The contract and the handler registry do not line up.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartupError {
    /// The contract itself is invalid.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Some operations have no handler.
    #[error("no handler registered for operation(s): {}", .0.join(", "))]
    MissingHandlers(Vec<String>),

    /// Some handlers target operations the contract does not declare.
    #[error("handler(s) registered for unknown operation(s): {}", .0.join(", "))]
    UnknownOperations(Vec<String>),
}

/// Routes, binds, invokes and responds.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use hostinfo_core::{Contract, HandlerResult, Operation, Schema};
/// use hostinfo_server::{Dispatcher, DispatcherConfig, HandlerRegistry};
///
/// let contract = Contract::builder("demo")
///     .operation(
///         Operation::builder("getHostname")
///             .path("/hostname")
///             .success(200, Schema::string())
///             .build(),
///     )
///     .build();
///
/// let mut handlers = HandlerRegistry::new();
/// handlers.register_fn("getHostname", |_ctx, _params| async {
///     HandlerResult::success(&"myhost")
/// });
///
/// let dispatcher = Dispatcher::new(Arc::new(contract), handlers, DispatcherConfig::default());
/// assert!(dispatcher.is_ok());
/// ```
#[derive(Debug)]
pub struct Dispatcher {
    contract: Arc<Contract>,
    router: Router,
    handlers: HandlerRegistry,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a dispatcher after checking that every contract operation
    /// has exactly one handler and every handler has an operation.
    pub fn new(
        contract: Arc<Contract>,
        handlers: HandlerRegistry,
        config: DispatcherConfig,
    ) -> Result<Self, StartupError> {
        contract.validate()?;

        let missing: Vec<String> = contract
            .operation_ids()
            .filter(|id| !handlers.contains(id))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(StartupError::MissingHandlers(missing));
        }

        let mut unknown: Vec<String> = handlers
            .operation_ids()
            .filter(|id| contract.get_operation(id).is_none())
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(StartupError::UnknownOperations(unknown));
        }

        let router = Router::from_contract(&contract);
        tracing::debug!(
            contract = contract.name(),
            routes = router.route_count(),
            "dispatcher ready"
        );

        Ok(Self {
            contract,
            router,
            handlers,
            config,
        })
    }

    /// Returns the contract being served.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Returns the dispatcher settings.
    #[must_use]
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatches one request. The body is never read.
    pub async fn dispatch<B>(&self, request: &Request<B>) -> HttpResponse {
        let request_id = RequestId::new();
        let responses = ResponseBuilder::new(request_id);
        let method = request.method();
        let path = request.uri().path();

        let Some(route) = self.router.match_route(method, path) else {
            tracing::debug!(%request_id, %method, path, "no operation matches");
            return responses.not_found(method, path);
        };
        let operation_id = route.operation_id();

        // Both lookups are guaranteed by `new`.
        let (Some(operation), Some(handler)) = (
            self.contract.get_operation(operation_id),
            self.handlers.get(operation_id),
        ) else {
            tracing::error!(%request_id, operation_id, "routed operation has no handler");
            return responses.generic_server_error();
        };

        let params = match hostinfo_extract::bind(
            operation,
            request.uri(),
            request.headers(),
            route.params(),
        ) {
            Ok(params) => params,
            Err(e) => {
                tracing::debug!(
                    %request_id,
                    operation_id,
                    parameter = e.parameter(),
                    error = %e,
                    "parameter binding failed"
                );
                return responses.binding_failure(&e);
            }
        };

        let mut ctx = RequestContext::with_request_id(request_id).with_operation_id(operation_id);
        if let Some(deadline) = self.config.request_deadline {
            ctx = ctx.with_deadline(deadline);
        }

        let result = handler.handle(&ctx, params).await;
        tracing::debug!(
            %request_id,
            operation_id,
            success = result.is_success(),
            elapsed_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
            "handler finished"
        );

        responses.from_result(operation, result)
    }
}
