//! # Router Module
//!
//! Matches inbound requests to the operations an
//! [`Application`](crate::server::Application) has wired.
//!
//! ## Overview
//!
//! Every wired operation is installed once per server base path: a document
//! declaring servers `/v1` and `/v2` yields `/v1/pets` and `/v2/pets` for the
//! operation at `/pets`. Matching happens in two steps:
//!
//! 1. **Path**: every route whose full template matches the concrete path is
//!    a candidate. Templates with fewer variables are tried first, so
//!    `/pets/mine` wins over `/pets/{petId}`.
//! 2. **Method**: the first candidate with the request method is the match.
//!    When candidates exist but none has the method, the outcome is
//!    [`RouteOutcome::MethodNotAllowed`] rather than a miss.
//!
//! ## Example
//!
//! ```rust
//! use oasbind::router::{Router, RouteOutcome};
//! use oasbind::spec::Spec;
//! use http::Method;
//!
//! let spec = Spec::from_value(serde_json::json!({
//!     "openapi": "3.0.0",
//!     "info": {"title": "Pets", "version": "1"},
//!     "servers": [{"url": "/v1"}],
//!     "paths": {"/pets/{petId}": {"get": {"operationId": "getPet", "responses": {}}}}
//! })).unwrap();
//!
//! let router = Router::new(spec.operations(), &spec.base_paths());
//! match router.match_route(&Method::GET, "/v1/pets/7") {
//!     RouteOutcome::Matched(m) => assert_eq!(m.path_params["petId"], "7"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod core;

pub use core::{Route, RouteMatch, RouteOutcome, Router};
