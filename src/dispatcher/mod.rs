//! # Dispatcher Module
//!
//! Endpoints and the wrapper pipeline that runs around them.
//!
//! ## Handler Contract
//!
//! Every endpoint implements [`Handler`]: it takes an
//! [`IncomingRequest`](crate::gateway::IncomingRequest) and returns a boxed
//! future of [`HandlerOutput`]. Synchronous functions are adapted with
//! [`Endpoint::sync`], asynchronous ones with [`Endpoint::asynchronous`], so
//! the dispatcher awaits both the same way. The [`endpoint!`](crate::endpoint)
//! macro names the endpoint after the function it wraps.
//!
//! ## Request Flow
//!
//! 1. The request gets the route's full path pattern and path parameters
//! 2. Request validation (security failures → 403, anything else → 400)
//! 3. The endpoint runs
//! 4. A JSON object becomes a `200 application/json` response; a response
//!    passes through; any other JSON value is a contract violation
//! 5. Response validation, when enabled
//!
//! Every finished request is logged with its request id and latency.

mod core;
mod endpoint;

pub use core::Dispatcher;
pub use endpoint::{Endpoint, Handler, HandlerFuture, HandlerOutput};
