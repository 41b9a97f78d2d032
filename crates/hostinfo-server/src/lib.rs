//! # hostinfo server
//!
//! HTTP serving for a contract-driven service:
//!
//! - [`Router`] - contract-derived route table
//! - [`HandlerRegistry`] - handlers keyed by operation id
//! - [`Dispatcher`] - route, bind, invoke, respond
//! - [`ResponseBuilder`] - schema-checked JSON responses
//! - [`Server`] - listener lifecycle with graceful shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hostinfo_core::{Contract, HandlerResult, Operation, Schema};
//! use hostinfo_server::{Dispatcher, HandlerRegistry, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let contract = Contract::builder("demo")
//!         .operation(
//!             Operation::builder("getHostname")
//!                 .path("/hostname")
//!                 .success(200, Schema::string())
//!                 .build(),
//!         )
//!         .build();
//!
//!     let mut handlers = HandlerRegistry::new();
//!     handlers.register_fn("getHostname", |_ctx, _params| async {
//!         HandlerResult::success(&"myhost")
//!     });
//!
//!     let config = ServerConfig::default();
//!     let dispatcher = Dispatcher::new(Arc::new(contract), handlers, config.dispatcher_config())?;
//!     Server::new(config, dispatcher).run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
mod dispatcher;
mod handler;
mod response;
mod router;
mod server;
mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use dispatcher::{Dispatcher, DispatcherConfig, StartupError};
pub use handler::HandlerRegistry;
pub use response::{HttpResponse, ResponseBody, ResponseBuilder, REQUEST_ID_HEADER};
pub use router::{RouteMatch, Router};
pub use server::{BoundServer, Server, ServerBuilder, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
