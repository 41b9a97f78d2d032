//! Handler registration.
//!
//! The [`HandlerRegistry`] maps operation ids to handlers. It is filled in
//! once at startup and then moved into the [`Dispatcher`](crate::Dispatcher),
//! which checks it against the contract before any request is served.
//!
//! # Example
//!
//! ```rust
//! use hostinfo_core::HandlerResult;
//! use hostinfo_server::HandlerRegistry;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register_fn("getHostname", |_ctx, _params| async {
//!     HandlerResult::success(&"myhost")
//! });
//!
//! assert!(registry.contains("getHostname"));
//! assert_eq!(registry.len(), 1);
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use hostinfo_core::{BoundParams, FnHandler, Handler, HandlerResult, RequestContext};

/// Registry of handlers keyed by operation id.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates a new empty handler registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an operation.
    ///
    /// Registering the same operation twice replaces the earlier handler.
    pub fn register(&mut self, operation_id: impl Into<String>, handler: impl Handler) {
        self.register_arc(operation_id, Arc::new(handler));
    }

    /// Registers an already shared handler.
    pub fn register_arc(&mut self, operation_id: impl Into<String>, handler: Arc<dyn Handler>) {
        let operation_id = operation_id.into();
        if self.handlers.insert(operation_id.clone(), handler).is_some() {
            tracing::warn!(operation_id = %operation_id, "handler replaced");
        }
    }

    /// Registers an async closure as the handler for an operation.
    pub fn register_fn<F, Fut>(&mut self, operation_id: impl Into<String>, func: F)
    where
        F: Fn(RequestContext, BoundParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(operation_id, FnHandler::new(func));
    }

    /// Returns the handler for an operation.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(operation_id)
    }

    /// Checks if a handler is registered for an operation.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns all registered operation ids, in no particular order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.operation_ids().collect();
        ids.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("operations", &ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl Handler for Fixed {
        async fn handle(&self, _ctx: &RequestContext, _params: BoundParams) -> HandlerResult {
            HandlerResult::success(&self.0)
        }
    }

    #[test]
    fn test_registry_new() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("anything").is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = HandlerRegistry::new();
        registry.register("getHostname", Fixed("a"));
        registry.register_fn("getIP", |_ctx, _params| async {
            HandlerResult::success(&"10.0.0.1")
        });

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("getHostname"));
        assert!(registry.contains("getIP"));
        assert!(!registry.contains("getUser"));

        let mut ids: Vec<_> = registry.operation_ids().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["getHostname", "getIP"]);
    }

    #[tokio::test]
    async fn test_second_registration_replaces_first() {
        let mut registry = HandlerRegistry::new();
        registry.register("getHostname", Fixed("first"));
        registry.register("getHostname", Fixed("second"));

        assert_eq!(registry.len(), 1);
        let handler = registry.get("getHostname").unwrap();
        let result = handler
            .handle(&RequestContext::new(), BoundParams::new())
            .await;
        assert_eq!(result, HandlerResult::success(&"second"));
    }

    #[test]
    fn test_debug_lists_operations() {
        let mut registry = HandlerRegistry::new();
        registry.register("b", Fixed("x"));
        registry.register("a", Fixed("y"));
        assert_eq!(
            format!("{registry:?}"),
            r#"HandlerRegistry { operations: ["a", "b"] }"#
        );
    }
}
