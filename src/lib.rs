//! # oasbind
//!
//! **oasbind** turns an OpenAPI 3 document into both halves of an HTTP API:
//! a client whose operations mirror the document, and a server dispatcher
//! that routes inbound requests to endpoints. Both halves validate traffic
//! against the document.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Document loading (JSON/YAML), operation model, server resolution
//! - **[`template`]** - Path templates: build concrete paths, match them back
//! - **[`registry`]** - Operation lookup by id or snake_case fold
//! - **[`gateway`]** - Transport-neutral request/response and the validation gateway
//! - **[`validator`]** - `jsonschema`-backed request/response validation
//! - **[`security`]** - Security requirement checks and credential providers
//! - **[`client`]** - Client dispatch over a pluggable transport
//! - **[`dispatcher`]** - Handler contract and the wrapper pipeline
//! - **[`router`]** - Route table over operations × server base paths
//! - **[`server`]** - Endpoint wiring, routing and in-process transport
//!
//! ### Client Call Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Client
//!     participant Gateway as ValidationGateway
//!     participant Transport
//!
//!     Caller->>Client: call("get_pet_by_id", Call::new().arg(42))
//!     Client->>Client: resolve operation, build /pets/42
//!     Client->>Gateway: check_request
//!     alt invalid
//!         Gateway-->>Caller: ClientError::RequestValidation
//!     end
//!     Client->>Transport: send
//!     Transport-->>Client: OpenApiResponse
//!     Client->>Gateway: check_response (unless disabled)
//!     Client-->>Caller: OpenApiResponse
//! ```
//!
//! ### Server Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant App as Application
//!     participant Router
//!     participant Dispatcher
//!     participant Endpoint
//!
//!     Caller->>App: handle(IncomingRequest)
//!     App->>Router: match_route
//!     alt no route
//!         Router-->>Caller: 404 / 405
//!     end
//!     App->>Dispatcher: dispatch
//!     Dispatcher->>Dispatcher: request validation (403 / 400)
//!     Dispatcher->>Endpoint: call
//!     Endpoint-->>Dispatcher: JSON object or response
//!     Dispatcher->>Dispatcher: response validation (500)
//!     Dispatcher-->>Caller: OpenApiResponse
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use oasbind::client::{Call, Client};
//! use oasbind::dispatcher::Endpoint;
//! use oasbind::server::{Application, LocalTransport};
//! use oasbind::spec::Spec;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let spec = Spec::from_value(json!({
//!     "openapi": "3.0.0",
//!     "info": {"title": "Pets", "version": "1.0.0"},
//!     "servers": [{"url": "http://localhost/v1"}],
//!     "paths": {"/pets/{petId}": {"get": {
//!         "operationId": "getPetById",
//!         "parameters": [{"name": "petId", "in": "path", "required": true,
//!                         "schema": {"type": "integer"}}],
//!         "responses": {"200": {"description": "A pet"}}
//!     }}}
//! }))?;
//!
//! let app = Application::builder(spec.clone())
//!     .endpoint(Endpoint::sync("get_pet_by_id", |req| {
//!         json!({"id": req.path_param("petId")})
//!     }))
//!     .build()?;
//!
//! let client = Client::builder(spec)
//!     .transport(Arc::new(LocalTransport::new(Arc::new(app))))
//!     .build()?;
//! let response = client.call("get_pet_by_id", Call::new().arg(42))?;
//! assert_eq!(response.payload(), json!({"id": "42"}));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration
//!
//! Builder options cover everything; [`runtime_config::RuntimeConfig`]
//! reads server defaults from `OASBIND_*` variables and
//! [`logging::LogConfig`] configures the `tracing` subscriber.

pub mod cli;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod logging;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod security;
pub mod server;
pub mod spec;
pub mod template;
pub mod validator;
pub mod validator_cache;

pub use client::{Call, Client};
pub use dispatcher::Endpoint;
pub use error::{ClientError, ConfigError, DispatchError, SpecError};
pub use server::{Application, EndpointModule};
pub use spec::{load_spec, Spec};
