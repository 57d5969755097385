//! # Client
//!
//! A [`Client`] exposes every operation of a document as a callable,
//! reachable by its declared `operationId` or its snake_case fold.
//!
//! A call goes through these steps:
//!
//! 1. Positional arguments fill the path template.
//! 2. Headers, query and body are bound into an [`OpenApiRequest`](crate::gateway::OpenApiRequest).
//! 3. The request is validated; nothing is sent when it fails.
//! 4. The [`Transport`] sends it.
//! 5. A non-success status becomes [`ClientError::Status`](crate::error::ClientError::Status).
//! 6. The response is validated unless that was switched off.
//!
//! ```rust,no_run
//! use oasbind::client::{Call, Client};
//!
//! # fn main() -> Result<(), oasbind::error::ClientError> {
//! let client = Client::from_file("openapi.yaml")?;
//! let pet = client.call("get_pet_by_id", Call::new().arg(42))?;
//! println!("{}", pet.payload());
//! # Ok(())
//! # }
//! ```

mod core;
mod request;
mod transport;

pub use core::{Client, ClientBuilder, ClientOperation};
pub use request::{Call, CallBody};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
