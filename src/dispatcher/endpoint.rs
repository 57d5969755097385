use crate::gateway::{IncomingRequest, OpenApiResponse};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// What an endpoint produced.
///
/// Only a JSON object or a full response is acceptable; anything else is
/// rejected by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    Json(Value),
    Response(OpenApiResponse),
}

impl HandlerOutput {
    /// Short name of the JSON kind carried, used in contract violations.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerOutput::Response(_) => "response",
            HandlerOutput::Json(value) => json_kind(value),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

impl From<Value> for HandlerOutput {
    fn from(value: Value) -> Self {
        HandlerOutput::Json(value)
    }
}

impl From<OpenApiResponse> for HandlerOutput {
    fn from(response: OpenApiResponse) -> Self {
        HandlerOutput::Response(response)
    }
}

pub type HandlerFuture = BoxFuture<'static, HandlerOutput>;

/// Single handler contract: every endpoint is awaited the same way.
pub trait Handler: Send + Sync {
    fn call(&self, request: IncomingRequest) -> HandlerFuture;
}

struct SyncHandler<F>(F);

impl<F, R> Handler for SyncHandler<F>
where
    F: Fn(IncomingRequest) -> R + Send + Sync,
    R: Into<HandlerOutput>,
{
    fn call(&self, request: IncomingRequest) -> HandlerFuture {
        future::ready((self.0)(request).into()).boxed()
    }
}

struct AsyncHandler<F>(F);

impl<F, Fut, R> Handler for AsyncHandler<F>
where
    F: Fn(IncomingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: Into<HandlerOutput> + 'static,
{
    fn call(&self, request: IncomingRequest) -> HandlerFuture {
        (self.0)(request).map(Into::into).boxed()
    }
}

/// A named handler.
///
/// The name is what operation ids are matched against when the endpoint is
/// registered without an explicit id.
#[derive(Clone)]
pub struct Endpoint {
    name: String,
    handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").field("name", &self.name).finish()
    }
}

impl Endpoint {
    /// Wrap a synchronous function.
    pub fn sync<F, R>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(IncomingRequest) -> R + Send + Sync + 'static,
        R: Into<HandlerOutput> + 'static,
    {
        Self::from_handler(name, Arc::new(SyncHandler(f)))
    }

    /// Wrap an asynchronous function.
    pub fn asynchronous<F, Fut, R>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(IncomingRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Into<HandlerOutput> + 'static,
    {
        Self::from_handler(name, Arc::new(AsyncHandler(f)))
    }

    pub fn from_handler(name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same handler under another name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: Arc::clone(&self.handler),
        }
    }

    pub fn call(&self, request: IncomingRequest) -> HandlerFuture {
        self.handler.call(request)
    }

    /// Last segment of a stringified Rust path (`handlers :: get_pet` → `get_pet`).
    #[doc(hidden)]
    #[must_use]
    pub fn name_from_path(path: &str) -> String {
        path.rsplit("::").next().unwrap_or(path).trim().to_string()
    }
}

/// Build an [`Endpoint`] named after the function it wraps.
///
/// ```rust
/// use oasbind::endpoint;
///
/// mod pets {
///     use oasbind::gateway::IncomingRequest;
///     use serde_json::{json, Value};
///
///     pub fn get_pet(_req: IncomingRequest) -> Value {
///         json!({"id": 1})
///     }
///     pub async fn list_pets(_req: IncomingRequest) -> Value {
///         json!({"items": []})
///     }
/// }
///
/// assert_eq!(endpoint!(pets::get_pet).name(), "get_pet");
/// assert_eq!(endpoint!(async pets::list_pets).name(), "list_pets");
/// ```
#[macro_export]
macro_rules! endpoint {
    (async $($path:ident)::+) => {
        $crate::dispatcher::Endpoint::asynchronous(
            $crate::dispatcher::Endpoint::name_from_path(stringify!($($path)::+)),
            $($path)::+,
        )
    };
    ($($path:ident)::+) => {
        $crate::dispatcher::Endpoint::sync(
            $crate::dispatcher::Endpoint::name_from_path(stringify!($($path)::+)),
            $($path)::+,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    fn ping(_req: IncomingRequest) -> Value {
        json!({"pong": true})
    }

    async fn slow_ping(_req: IncomingRequest) -> OpenApiResponse {
        OpenApiResponse::new(StatusCode::NO_CONTENT)
    }

    #[test]
    fn sync_and_async_share_one_contract() {
        let sync = crate::endpoint!(ping);
        let asynchronous = crate::endpoint!(async slow_ping);
        assert_eq!(sync.name(), "ping");
        assert_eq!(asynchronous.name(), "slow_ping");

        let out = futures::executor::block_on(sync.call(IncomingRequest::get("/ping")));
        assert_eq!(out, HandlerOutput::Json(json!({"pong": true})));
        let out = futures::executor::block_on(asynchronous.call(IncomingRequest::get("/ping")));
        assert_eq!(out.kind(), "response");
    }

    #[test]
    fn kinds() {
        assert_eq!(HandlerOutput::from(json!([1])).kind(), "array");
        assert_eq!(HandlerOutput::from(json!("x")).kind(), "string");
        assert_eq!(HandlerOutput::from(json!(1.5)).kind(), "number");
        assert_eq!(HandlerOutput::from(json!(false)).kind(), "boolean");
        assert_eq!(HandlerOutput::from(Value::Null).kind(), "null");
    }

    #[test]
    fn names_from_paths() {
        assert_eq!(Endpoint::name_from_path("handlers :: pets :: get_pet"), "get_pet");
        assert_eq!(Endpoint::name_from_path("ping"), "ping");
        let renamed = Endpoint::sync("a", ping).renamed("b");
        assert_eq!(renamed.name(), "b");
    }
}
