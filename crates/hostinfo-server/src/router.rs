//! Request routing and path matching.
//!
//! The router maps an incoming method + path to the operation id that the
//! contract declares for it, capturing `{placeholder}` segments on the way.
//! It is built once from a validated [`Contract`] and never changes.
//!
//! # Example
//!
//! ```rust
//! use hostinfo_core::{Contract, Operation, ParamSpec, ParamType};
//! use hostinfo_server::Router;
//! use http::Method;
//!
//! let contract = Contract::builder("demo")
//!     .operation(Operation::builder("getHostname").path("/hostname").build())
//!     .operation(
//!         Operation::builder("getUser")
//!             .path("/users/{userId}")
//!             .param(ParamSpec::path("userId", ParamType::String))
//!             .build(),
//!     )
//!     .build();
//!
//! let router = Router::from_contract(&contract);
//!
//! let m = router.match_route(&Method::GET, "/users/42").unwrap();
//! assert_eq!(m.operation_id(), "getUser");
//! assert_eq!(m.params().get("userId"), Some("42"));
//!
//! assert!(router.match_route(&Method::POST, "/hostname").is_none());
//! ```

use hostinfo_core::contract::PathSegment;
use hostinfo_core::Contract;
use hostinfo_extract::PathParams;
use http::Method;

/// A matched route with its captured path segments.
///
/// Returned by [`Router::match_route`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation_id: String,
    params: PathParams,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, params: PathParams) -> Self {
        Self {
            operation_id: operation_id.into(),
            params,
        }
    }

    /// Returns the operation ID for this route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the captured path segments, still percent-encoded.
    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<Segment>,
    operation_id: String,
}

impl Route {
    fn match_path(&self, path: &str) -> Option<PathParams> {
        let mut actual = path.split('/').filter(|s| !s.is_empty());
        let mut params = PathParams::new();

        for pattern in &self.segments {
            let segment = actual.next()?;
            match pattern {
                Segment::Literal(expected) if expected == segment => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push(name.as_str(), segment),
            }
        }

        // Extra request segments mean a different route.
        if actual.next().is_some() {
            return None;
        }

        Some(params)
    }
}

/// Contract-derived route table.
///
/// Routes are tried in contract declaration order and the first match
/// wins. Contract validation guarantees at most one route can match.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Builds the route table for every operation in `contract`.
    #[must_use]
    pub fn from_contract(contract: &Contract) -> Self {
        let routes = contract
            .operations()
            .iter()
            .map(|op| Route {
                method: op.method().clone(),
                segments: op
                    .path_segments()
                    .map(|seg| match seg {
                        PathSegment::Literal(lit) => Segment::Literal(lit.to_string()),
                        PathSegment::Placeholder(name) => Segment::Param(name.to_string()),
                    })
                    .collect(),
                operation_id: op.operation_id().to_string(),
            })
            .collect();

        Self { routes }
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches an incoming request to a route.
    ///
    /// Literal segments must match exactly; empty segments (including a
    /// trailing slash) are ignored.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route
                    .match_path(path)
                    .map(|params| RouteMatch::new(route.operation_id.as_str(), params))
            })
    }

    /// Checks if a specific operation ID is routed.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostinfo_core::{Operation, ParamSpec, ParamType};
    use proptest::prelude::*;

    fn contract() -> Contract {
        Contract::builder("test")
            .operation(Operation::builder("getHostname").path("/hostname").build())
            .operation(Operation::builder("getIP").path("/ip").build())
            .operation(
                Operation::builder("getPost")
                    .path("/users/{userId}/posts/{postId}")
                    .param(ParamSpec::path("userId", ParamType::String))
                    .param(ParamSpec::path("postId", ParamType::Integer))
                    .build(),
            )
            .operation(
                Operation::builder("createPost")
                    .method(Method::POST)
                    .path("/users/{userId}/posts")
                    .param(ParamSpec::path("userId", ParamType::String))
                    .success(201, hostinfo_core::Schema::Any)
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_from_contract() {
        let router = Router::from_contract(&contract());
        assert_eq!(router.route_count(), 4);
        assert!(router.has_operation("getIP"));
        assert!(!router.has_operation("deleteUser"));
    }

    #[test]
    fn test_static_match() {
        let router = Router::from_contract(&contract());

        let m = router.match_route(&Method::GET, "/hostname").unwrap();
        assert_eq!(m.operation_id(), "getHostname");
        assert!(m.params().is_empty());
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let router = Router::from_contract(&contract());
        let m = router.match_route(&Method::GET, "/ip/").unwrap();
        assert_eq!(m.operation_id(), "getIP");
    }

    #[test]
    fn test_multiple_params() {
        let router = Router::from_contract(&contract());

        let m = router
            .match_route(&Method::GET, "/users/alice/posts/7")
            .unwrap();
        assert_eq!(m.operation_id(), "getPost");
        assert_eq!(m.params().get("userId"), Some("alice"));
        assert_eq!(m.params().get("postId"), Some("7"));
    }

    #[test]
    fn test_params_are_not_decoded() {
        let router = Router::from_contract(&contract());
        let m = router
            .match_route(&Method::GET, "/users/a%20b/posts/1")
            .unwrap();
        assert_eq!(m.params().get("userId"), Some("a%20b"));
    }

    #[test]
    fn test_method_mismatch() {
        let router = Router::from_contract(&contract());
        assert!(router.match_route(&Method::DELETE, "/hostname").is_none());
        assert!(router.match_route(&Method::GET, "/users/a/posts").is_none());

        let m = router.match_route(&Method::POST, "/users/a/posts").unwrap();
        assert_eq!(m.operation_id(), "createPost");
    }

    #[test]
    fn test_segment_count_mismatch() {
        let router = Router::from_contract(&contract());
        assert!(router.match_route(&Method::GET, "/").is_none());
        assert!(router.match_route(&Method::GET, "/hostname/extra").is_none());
        assert!(router.match_route(&Method::GET, "/users/a/posts/1/x").is_none());
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        let router = Router::from_contract(&contract());
        assert!(router.match_route(&Method::GET, "/Hostname").is_none());
    }

    #[test]
    fn test_empty_contract() {
        let router = Router::from_contract(&Contract::builder("empty").build());
        assert_eq!(router.route_count(), 0);
        assert!(router.match_route(&Method::GET, "/").is_none());
    }

    proptest! {
        #[test]
        fn prop_unknown_prefix_never_matches(segment in "[a-z]{1,10}", rest in "[a-z/]{0,20}") {
            prop_assume!(segment != "hostname" && segment != "ip" && segment != "users");
            let router = Router::from_contract(&contract());
            let path = format!("/{segment}/{rest}");
            prop_assert!(router.match_route(&Method::GET, &path).is_none());
        }

        #[test]
        fn prop_captured_segment_round_trips(user in "[A-Za-z0-9_.~-]{1,16}", post in 0u32..100_000) {
            let router = Router::from_contract(&contract());
            let path = format!("/users/{user}/posts/{post}");
            let m = router.match_route(&Method::GET, &path).unwrap();
            let expected_post = post.to_string();
            prop_assert_eq!(m.params().get("userId"), Some(user.as_str()));
            prop_assert_eq!(m.params().get("postId"), Some(expected_post.as_str()));
        }
    }
}
