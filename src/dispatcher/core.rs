use super::endpoint::{json_kind, Endpoint, HandlerOutput};
use crate::error::DispatchError;
use crate::gateway::{IncomingRequest, OpenApiResponse, ValidationGateway};
use crate::ids::RequestId;
use crate::router::RouteMatch;
use crate::spec::Spec;
use http::StatusCode;
use std::time::Instant;
use tracing::{debug, error, info};

/// Runs the wrapper pipeline around one endpoint invocation.
///
/// The dispatcher holds no per-request state; one instance serves every
/// route of an application.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    spec: Spec,
    gateway: ValidationGateway,
}

impl Dispatcher {
    #[must_use]
    pub fn new(spec: Spec, gateway: ValidationGateway) -> Self {
        Self { spec, gateway }
    }

    #[must_use]
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    #[must_use]
    pub fn gateway(&self) -> &ValidationGateway {
        &self.gateway
    }

    /// Validate, invoke, convert, validate again.
    ///
    /// The request is rebuilt with the route's full path pattern and the
    /// path parameters recovered by the router before anything else runs.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Validation`] when the request (403/400) or the
    ///   response (500) fails validation
    /// - [`DispatchError::ContractViolation`] when the endpoint returns a
    ///   JSON value that is not an object
    pub async fn dispatch(
        &self,
        route: &RouteMatch,
        endpoint: &Endpoint,
        mut request: IncomingRequest,
    ) -> Result<OpenApiResponse, DispatchError> {
        let request_id = RequestId::from_header_or_new(request.header("x-request-id"));
        request.path_pattern = Some(route.route.path_pattern().to_string());
        request.path_params = route.path_params.clone();

        self.gateway.check_request(&self.spec, &request)?;

        let start = Instant::now();
        debug!(
            request_id = %request_id,
            operation_id = %route.route.operation_id(),
            endpoint = %endpoint.name(),
            "Handler start"
        );
        let output = endpoint.call(request.clone()).await;
        let latency_ms = start.elapsed().as_millis();

        let response = match output {
            HandlerOutput::Response(response) => response,
            HandlerOutput::Json(value) if value.is_object() => {
                OpenApiResponse::json(StatusCode::OK, &value)
            }
            HandlerOutput::Json(value) => {
                error!(
                    request_id = %request_id,
                    endpoint = %endpoint.name(),
                    found = json_kind(&value),
                    "Endpoint returned an unsupported value"
                );
                return Err(DispatchError::ContractViolation {
                    endpoint: endpoint.name().to_string(),
                    found: json_kind(&value),
                });
            }
        };

        self.gateway
            .check_response(&self.spec, &request, &response)?;

        info!(
            request_id = %request_id,
            operation_id = %route.route.operation_id(),
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            latency_ms,
            "Handler finished"
        );
        Ok(response.with_header("x-request-id", request_id.to_string()))
    }
}
