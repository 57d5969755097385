use crate::spec::Operation;
use crate::template::{PathParams, PathTemplate};
use http::Method;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One installed `(operation, base path)` pair.
#[derive(Debug, Clone)]
pub struct Route {
    pub operation: Arc<Operation>,
    /// Server base path this route is installed under (`""` for root).
    pub base_path: String,
    /// Operation template prefixed with the base path.
    pub template: PathTemplate,
}

impl Route {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.operation.method
    }

    /// Full path pattern, base path included.
    #[must_use]
    pub fn path_pattern(&self) -> &str {
        self.template.as_str()
    }

    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation.operation_id
    }
}

/// A route together with the parameters recovered from the path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub path_params: PathParams,
}

/// Result of routing a request.
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    Matched(RouteMatch),
    /// The path exists, but only for other methods.
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

/// Routing table over operations × base paths.
#[derive(Debug, Clone, Default)]
pub struct Router {
    /// Sorted by variable count, then installation order.
    routes: Vec<Arc<Route>>,
}

impl Router {
    /// Install each operation once per base path.
    #[must_use]
    pub fn new(operations: &[Arc<Operation>], base_paths: &[String]) -> Self {
        let mut routes: Vec<Arc<Route>> = Vec::with_capacity(operations.len() * base_paths.len().max(1));
        for base_path in base_paths {
            for op in operations {
                let template = op.template.with_prefix(base_path);
                debug!(
                    operation_id = %op.operation_id,
                    method = %op.method,
                    path_pattern = %template,
                    "Route registered"
                );
                routes.push(Arc::new(Route {
                    operation: Arc::clone(op),
                    base_path: base_path.clone(),
                    template,
                }));
            }
        }
        routes.sort_by_key(|r| r.template.variables().len());

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method(), r.path_pattern()))
            .collect();
        info!(
            routes_count = routes.len(),
            base_paths = ?base_paths,
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );
        Self { routes }
    }

    /// Installed routes, in match priority order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Match a method and concrete path (without query string).
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteOutcome {
        debug!(method = %method, path = %path, "Route match attempt");
        let mut allowed: Vec<Method> = Vec::new();
        for route in &self.routes {
            let Some(path_params) = route.template.matches(path) else {
                continue;
            };
            if route.method() == method {
                debug!(
                    method = %method,
                    path = %path,
                    operation_id = %route.operation_id(),
                    route_pattern = %route.path_pattern(),
                    path_params = ?path_params,
                    "Route matched"
                );
                return RouteOutcome::Matched(RouteMatch {
                    route: Arc::clone(route),
                    path_params,
                });
            }
            if !allowed.contains(route.method()) {
                allowed.push(route.method().clone());
            }
        }

        if allowed.is_empty() {
            warn!(method = %method, path = %path, "No route matched");
            RouteOutcome::NotFound
        } else {
            warn!(method = %method, path = %path, allowed = ?allowed, "Method not allowed");
            RouteOutcome::MethodNotAllowed { allowed }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use serde_json::json;

    fn spec() -> Spec {
        Spec::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "servers": [{"url": "http://localhost:8080/"}, {"url": "http://localhost:8080/with/path"}],
            "paths": {
                "/pets/{petId}": {"get": {"operationId": "getPet", "responses": {}}},
                "/pets/mine": {"get": {"operationId": "myPets", "responses": {}}},
                "/pets": {"post": {"operationId": "addPet", "responses": {}}}
            }
        }))
        .unwrap()
    }

    fn matched(outcome: RouteOutcome) -> RouteMatch {
        match outcome {
            RouteOutcome::Matched(m) => m,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn routes_per_base_path() {
        let spec = spec();
        let router = Router::new(spec.operations(), &spec.base_paths());
        assert_eq!(router.routes().len(), 6);
        let m = matched(router.match_route(&Method::GET, "/with/path/pets/3"));
        assert_eq!(m.route.operation_id(), "getPet");
        assert_eq!(m.route.base_path, "/with/path");
        assert_eq!(m.path_params["petId"], "3");
        let root = matched(router.match_route(&Method::GET, "/pets/3"));
        assert_eq!(root.route.base_path, "");
    }

    #[test]
    fn literal_routes_win() {
        let spec = spec();
        let router = Router::new(spec.operations(), &spec.base_paths());
        let m = matched(router.match_route(&Method::GET, "/pets/mine"));
        assert_eq!(m.route.operation_id(), "myPets");
    }

    #[test]
    fn root_under_a_base_path_keeps_its_slash() {
        let spec = Spec::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "servers": [{"url": "http://localhost:8080/v1"}],
            "paths": {"/": {"get": {"operationId": "index", "responses": {}}}}
        }))
        .unwrap();
        let router = Router::new(spec.operations(), &spec.base_paths());
        assert_eq!(matched(router.match_route(&Method::GET, "/v1/")).route.operation_id(), "index");
        assert!(matches!(router.match_route(&Method::GET, "/v1"), RouteOutcome::NotFound));
    }

    #[test]
    fn not_found_and_method_not_allowed() {
        let spec = spec();
        let router = Router::new(spec.operations(), &spec.base_paths());
        assert!(matches!(router.match_route(&Method::GET, "/owners"), RouteOutcome::NotFound));
        match router.match_route(&Method::GET, "/pets") {
            RouteOutcome::MethodNotAllowed { allowed } => assert_eq!(allowed, [Method::POST]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
