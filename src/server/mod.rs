//! # Server Module
//!
//! The server half wires document operations to endpoints and routes
//! inbound requests to them.
//!
//! ## Wiring
//!
//! An [`Application`] is built from a [`Spec`](crate::spec::Spec) and endpoints
//! supplied in one of three ways:
//!
//! - **By name**: [`ApplicationBuilder::endpoint`] resolves the endpoint's own
//!   name against operation ids (exact, then snake_case fold)
//! - **Explicitly**: [`ApplicationBuilder::endpoint_for`] names the operation
//! - **From a module**: [`ApplicationBuilder::module`] looks up every
//!   operation in an [`EndpointModule`]; dotted ids (`pets.getPet`) name a
//!   submodule and a function
//!
//! Every fault is raised by [`ApplicationBuilder::build`]; an application
//! is never returned partially wired.
//!
//! ## Routing
//!
//! Each wired operation is installed once per server base path, so a
//! document declaring `http://host/` and `http://host/v1` answers on both
//! `/pets` and `/v1/pets`. Unmatched paths answer 404, paths matched with
//! the wrong method 405.
//!
//! ## Example
//!
//! ```rust,no_run
//! use oasbind::dispatcher::Endpoint;
//! use oasbind::gateway::IncomingRequest;
//! use oasbind::server::{Application, EndpointModule};
//! use serde_json::json;
//!
//! # async fn serve() -> Result<(), oasbind::error::ConfigError> {
//! let module = EndpointModule::new("pets")
//!     .endpoint(Endpoint::sync("list_pets", |_req| json!({"items": []})));
//! let app = Application::from_file("openapi.yaml", module)?;
//! let response = app.handle(IncomingRequest::get("/v1/pets")).await;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

mod app;
mod local;
mod module;

pub use app::{Application, ApplicationBuilder};
pub use local::LocalTransport;
pub use module::EndpointModule;
