//! # hostinfo core
//!
//! Core types for the contract-driven dispatch pipeline:
//!
//! - [`Contract`] / [`Operation`] - the declarative operation table
//! - [`Schema`] - JSON payload shapes with validation
//! - [`BoundParams`] - typed parameters bound for one request
//! - [`Handler`] / [`HandlerResult`] - the handler capability and its outcome
//! - [`RequestContext`] / [`RequestId`] - per-request state
//! - [`ContractError`] / [`ErrorBody`] - contract defects and the wire error

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod contract;
mod context;
mod error;
mod handler;
mod params;
mod schema;

pub use context::{RequestContext, RequestId};
pub use contract::{
    Contract, Operation, ParamLocation, ParamSpec, ParamType, ResponseSpec, Responses,
};
pub use error::{ContractError, ErrorBody, GENERIC_SERVER_ERROR_MESSAGE};
pub use handler::{FnHandler, Handler, HandlerResult};
pub use params::{BoundParams, ParamValue};
pub use schema::{Schema, SchemaViolation};
