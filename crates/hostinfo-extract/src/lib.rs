//! # hostinfo extract
//!
//! Binds raw request inputs to an operation's declared parameters.
//!
//! - [`bind`] - path, query and header values to typed [`hostinfo_core::BoundParams`]
//! - [`PathParams`] - raw segments captured by the router
//! - [`BindingError`] - why a request could not be bound

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod error;
mod path;

pub use binder::bind;
pub use error::{BindingError, BindingErrorKind};
pub use path::PathParams;
