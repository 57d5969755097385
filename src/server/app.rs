use super::module::EndpointModule;
use crate::dispatcher::{Dispatcher, Endpoint};
use crate::error::{ConfigError, DispatchError};
use crate::gateway::{IncomingRequest, OpenApiResponse, ValidationGateway};
use crate::registry::OperationRegistry;
use crate::router::{Route, RouteOutcome, Router};
use crate::runtime_config::RuntimeConfig;
use crate::security::{SecurityProvider, SecurityProviders};
use crate::spec::{load_spec, Operation, Spec};
use crate::validator::{SchemaValidator, Validator};
use crate::validator_cache::ValidatorCache;
use http::Method;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Server half: operations wired to endpoints, routed per server base path.
#[derive(Debug, Clone)]
pub struct Application {
    registry: OperationRegistry,
    enforce_case: bool,
    dispatcher: Dispatcher,
    /// Keyed by declared `operationId`.
    endpoints: HashMap<String, Endpoint>,
    router: Router,
}

impl Application {
    #[must_use]
    pub fn builder(spec: Spec) -> ApplicationBuilder {
        ApplicationBuilder::new(spec)
    }

    /// Application for a document on disk, wired from a module with default options.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Spec`] when the document cannot be loaded, or any
    /// module resolution fault.
    pub fn from_file(path: impl AsRef<Path>, module: EndpointModule) -> Result<Self, ConfigError> {
        Self::builder(load_spec(path)?).module(module).build()
    }

    #[must_use]
    pub fn spec(&self) -> &Spec {
        self.dispatcher.spec()
    }

    #[must_use]
    pub fn validates_responses(&self) -> bool {
        self.dispatcher.gateway().validates_responses()
    }

    /// Installed routes, one per wired operation and server base path.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        self.router.routes()
    }

    /// Endpoint wired to an operation id.
    #[must_use]
    pub fn endpoint(&self, operation_id: &str) -> Option<&Endpoint> {
        self.endpoints.get(operation_id)
    }

    /// Wire an endpoint to an operation.
    ///
    /// Without an explicit id the endpoint's own name is resolved (exact id
    /// first, then the snake_case fold when case enforcement is on). A
    /// previously wired endpoint for the same operation is replaced.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownOperation`] when the name resolves to nothing.
    pub fn set_endpoint(&mut self, endpoint: Endpoint, operation_id: Option<&str>) -> Result<(), ConfigError> {
        let operation = wire(
            &self.registry,
            self.enforce_case,
            &mut self.endpoints,
            endpoint,
            operation_id,
        )?;
        self.router = build_router(self.spec(), &self.endpoints);
        debug!(operation_id = %operation.operation_id, "Routes rebuilt");
        Ok(())
    }

    /// Route and dispatch a request, returning the fault itself on failure.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] / [`DispatchError::MethodNotAllowed`]
    /// from routing, anything from [`Dispatcher::dispatch`].
    pub async fn dispatch(&self, request: IncomingRequest) -> Result<OpenApiResponse, DispatchError> {
        let matched = match self.router.match_route(&request.method, &request.path) {
            RouteOutcome::Matched(m) => m,
            RouteOutcome::MethodNotAllowed { .. } => {
                return Err(DispatchError::MethodNotAllowed {
                    method: request.method.to_string(),
                    path: request.path,
                })
            }
            RouteOutcome::NotFound => {
                return Err(DispatchError::NotFound {
                    method: request.method.to_string(),
                    path: request.path,
                })
            }
        };
        let Some(endpoint) = self.endpoints.get(matched.route.operation_id()) else {
            return Err(DispatchError::NotFound {
                method: request.method.to_string(),
                path: request.path,
            });
        };
        self.dispatcher.dispatch(&matched, endpoint, request).await
    }

    /// Route and dispatch a request; faults become JSON error responses
    /// (`{"error": …, "details": [...]}`).
    pub async fn handle(&self, request: IncomingRequest) -> OpenApiResponse {
        let allowed = match self.router.match_route(&request.method, &request.path) {
            RouteOutcome::MethodNotAllowed { allowed } => allowed,
            _ => Vec::new(),
        };
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => error_response(&err, &allowed),
        }
    }
}

fn error_response(err: &DispatchError, allowed: &[Method]) -> OpenApiResponse {
    let status = err.status();
    match err {
        DispatchError::Validation(fault) => OpenApiResponse::error(
            status,
            fault.title(),
            fault.issues().iter().map(|i| i.to_json()).collect(),
        ),
        DispatchError::ContractViolation { .. } => {
            OpenApiResponse::error(status, &err.to_string(), Vec::new())
        }
        DispatchError::NotFound { method, path } => OpenApiResponse::error(
            status,
            "Not Found",
            vec![serde_json::json!({"method": method, "path": path})],
        ),
        DispatchError::MethodNotAllowed { method, path } => {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            OpenApiResponse::error(
                status,
                "Method Not Allowed",
                vec![serde_json::json!({"method": method, "path": path})],
            )
            .with_header("allow", allow)
        }
    }
}

fn wire<'r>(
    registry: &'r OperationRegistry,
    enforce_case: bool,
    endpoints: &mut HashMap<String, Endpoint>,
    endpoint: Endpoint,
    operation_id: Option<&str>,
) -> Result<&'r Arc<Operation>, ConfigError> {
    let name = operation_id.map_or_else(|| endpoint.name().to_string(), str::to_string);
    let operation = registry.resolve(&name, enforce_case)?;
    if let Some(previous) = endpoints.insert(operation.operation_id.clone(), endpoint) {
        warn!(
            operation_id = %operation.operation_id,
            replaced = %previous.name(),
            "Endpoint replaced"
        );
    } else {
        debug!(operation_id = %operation.operation_id, requested = %name, "Endpoint wired");
    }
    Ok(operation)
}

fn build_router(spec: &Spec, endpoints: &HashMap<String, Endpoint>) -> Router {
    let wired: Vec<Arc<Operation>> = spec
        .operations()
        .iter()
        .filter(|op| endpoints.contains_key(&op.operation_id))
        .cloned()
        .collect();
    Router::new(&wired, &spec.base_paths())
}

/// Options for [`Application`].
pub struct ApplicationBuilder {
    spec: Spec,
    validate_responses: bool,
    enforce_case: bool,
    schema_cache: bool,
    validator: Option<Arc<dyn Validator>>,
    providers: SecurityProviders,
    module: Option<EndpointModule>,
    endpoints: Vec<(Option<String>, Endpoint)>,
}

impl ApplicationBuilder {
    #[must_use]
    pub fn new(spec: Spec) -> Self {
        Self {
            spec,
            validate_responses: true,
            enforce_case: true,
            schema_cache: true,
            validator: None,
            providers: SecurityProviders::new(),
            module: None,
            endpoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    #[must_use]
    pub fn enforce_case(mut self, enabled: bool) -> Self {
        self.enforce_case = enabled;
        self
    }

    /// Apply environment-driven options.
    #[must_use]
    pub fn runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.validate_responses = config.validate_responses;
        self.enforce_case = config.enforce_case;
        self.schema_cache = config.schema_cache;
        self
    }

    /// Replace the default schema validator.
    ///
    /// Security providers registered on the builder only apply to the
    /// default validator.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn security_provider(mut self, scheme: impl Into<String>, provider: Arc<dyn SecurityProvider>) -> Self {
        self.providers.insert(scheme.into(), provider);
        self
    }

    /// Resolve an endpoint for every operation from a module.
    #[must_use]
    pub fn module(mut self, module: EndpointModule) -> Self {
        self.module = Some(module);
        self
    }

    /// Wire an endpoint by its own name.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push((None, endpoint));
        self
    }

    #[must_use]
    pub fn endpoint_for(mut self, operation_id: impl Into<String>, endpoint: Endpoint) -> Self {
        self.endpoints.push((Some(operation_id.into()), endpoint));
        self
    }

    /// Resolve every endpoint and install the routes.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; nothing is returned partially wired.
    pub fn build(self) -> Result<Application, ConfigError> {
        let registry = OperationRegistry::new(&self.spec);
        let mut endpoints: HashMap<String, Endpoint> = HashMap::with_capacity(registry.len());

        if let Some(module) = &self.module {
            for op in registry.operations() {
                let endpoint = module.resolve(&op.operation_id, self.enforce_case)?;
                debug!(
                    operation_id = %op.operation_id,
                    module = %module.name(),
                    endpoint = %endpoint.name(),
                    "Endpoint resolved from module"
                );
                endpoints.insert(op.operation_id.clone(), endpoint.clone());
            }
        }
        for (operation_id, endpoint) in self.endpoints {
            wire(
                &registry,
                self.enforce_case,
                &mut endpoints,
                endpoint,
                operation_id.as_deref(),
            )?;
        }

        let validator: Arc<dyn Validator> = match self.validator {
            Some(validator) => {
                if !self.providers.is_empty() {
                    warn!(
                        providers = self.providers.len(),
                        "Security providers ignored by a custom validator"
                    );
                }
                validator
            }
            None => {
                let cache = ValidatorCache::new(self.schema_cache);
                let compiled = cache.precompile(&self.spec);
                debug!(compiled, "Schema validators precompiled");
                Arc::new(SchemaValidator::new(cache).with_providers(self.providers))
            }
        };

        let router = build_router(&self.spec, &endpoints);
        let unwired: Vec<&str> = registry
            .operations()
            .iter()
            .filter(|op| !endpoints.contains_key(&op.operation_id))
            .map(|op| op.operation_id.as_str())
            .collect();
        if !unwired.is_empty() {
            debug!(unwired = ?unwired, "Operations without an endpoint");
        }
        info!(
            title = %self.spec.title(),
            endpoints = endpoints.len(),
            routes = router.routes().len(),
            validate_responses = self.validate_responses,
            enforce_case = self.enforce_case,
            "Application built"
        );

        let gateway = ValidationGateway::new(validator, self.validate_responses);
        Ok(Application {
            registry,
            enforce_case: self.enforce_case,
            dispatcher: Dispatcher::new(self.spec, gateway),
            endpoints,
            router,
        })
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("validate_responses", &self.validate_responses)
            .field("enforce_case", &self.enforce_case)
            .field("endpoints", &self.endpoints.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::{json, Value};

    fn spec() -> Spec {
        Spec::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "Test Spec", "version": "1"},
            "servers": [{"url": "http://localhost/"}, {"url": "http://localhost/with/path"}],
            "paths": {
                "/test": {"get": {
                    "operationId": "dummyTestEndpoint",
                    "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {
                        "type": "object", "required": ["result"],
                        "properties": {"result": {"type": "string"}}
                    }}}}}
                }},
                "/pets/{petId}": {"get": {
                    "operationId": "getPet",
                    "parameters": [{"name": "petId", "in": "path", "required": true, "schema": {"type": "integer"}}],
                    "responses": {"200": {"description": "ok"}}
                }}
            }
        }))
        .unwrap()
    }

    fn test_endpoint(_req: IncomingRequest) -> Value {
        json!({"result": "ok"})
    }

    fn get_pet(req: IncomingRequest) -> Value {
        json!({"id": req.path_param("petId")})
    }

    fn run<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn wires_by_folded_name_and_installs_per_base_path() {
        let app = Application::builder(spec())
            .endpoint(Endpoint::sync("dummy_test_endpoint", test_endpoint))
            .endpoint_for("getPet", Endpoint::sync("x", get_pet))
            .build()
            .unwrap();
        assert_eq!(app.routes().len(), 4);
        let resp = run(app.handle(IncomingRequest::get("/with/path/test")));
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.payload(), json!({"result": "ok"}));
        assert!(resp.header("x-request-id").is_some());
    }

    #[test]
    fn unknown_names_fail_at_construction() {
        let err = Application::builder(spec())
            .endpoint(Endpoint::sync("nope", test_endpoint))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown operationId: nope.");

        let err = Application::builder(spec())
            .enforce_case(false)
            .endpoint(Endpoint::sync("dummy_test_endpoint", test_endpoint))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOperation(_)));
    }

    #[test]
    fn set_endpoint_replaces() {
        let mut app = Application::builder(spec())
            .endpoint(Endpoint::sync("dummy_test_endpoint", test_endpoint))
            .build()
            .unwrap();
        app.set_endpoint(Endpoint::sync("other", |_req| json!({"result": "new"})), Some("dummyTestEndpoint"))
            .unwrap();
        assert_eq!(app.endpoint("dummyTestEndpoint").unwrap().name(), "other");
        let resp = run(app.handle(IncomingRequest::get("/test")));
        assert_eq!(resp.payload(), json!({"result": "new"}));
    }

    #[test]
    fn routing_failures() {
        let app = Application::builder(spec())
            .endpoint(Endpoint::sync("dummy_test_endpoint", test_endpoint))
            .build()
            .unwrap();
        let resp = run(app.handle(IncomingRequest::get("/pets/1")));
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        let resp = run(app.handle(IncomingRequest::post("/test")));
        assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.header("allow"), Some("GET"));
    }

    #[test]
    fn invalid_path_parameter_is_bad_request() {
        let app = Application::builder(spec())
            .endpoint(Endpoint::sync("get_pet", get_pet))
            .build()
            .unwrap();
        let resp = run(app.handle(IncomingRequest::get("/pets/abc")));
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.payload()["error"], "Bad request");
        let resp = run(app.handle(IncomingRequest::get("/pets/7")));
        assert_eq!(resp.payload(), json!({"id": "7"}));
    }

    #[test]
    fn response_validation_toggle() {
        let bad = |_req: IncomingRequest| json!({"unexpected": 1});
        let strict = Application::builder(spec())
            .endpoint_for("dummyTestEndpoint", Endpoint::sync("bad", bad))
            .build()
            .unwrap();
        let err = run(strict.dispatch(IncomingRequest::get("/test"))).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let lenient = Application::builder(spec())
            .validate_responses(false)
            .endpoint_for("dummyTestEndpoint", Endpoint::sync("bad", bad))
            .build()
            .unwrap();
        assert!(run(lenient.dispatch(IncomingRequest::get("/test"))).is_ok());
    }

    #[test]
    fn non_object_output_is_a_contract_violation() {
        let app = Application::builder(spec())
            .endpoint_for("dummyTestEndpoint", Endpoint::sync("listy", |_req| json!([1, 2])))
            .build()
            .unwrap();
        let err = run(app.dispatch(IncomingRequest::get("/test"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The endpoint function `listy` must return either a JSON object or a Response, got array"
        );
    }
}
