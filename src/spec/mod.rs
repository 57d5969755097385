//! # Spec Model
//!
//! Normalized, immutable view of an OpenAPI 3 document: servers, operations,
//! parameters, request bodies, responses and security.
//!
//! The document is decoded twice. `oas3` checks the structure and supplies
//! typed `info`, `servers`, parameters and security schemes, while the raw
//! `serde_json::Value` (with key order preserved) backs schema extraction,
//! `$ref` expansion and [`Spec::field`] lookups.

pub use oas3::spec::{SecurityRequirement, SecurityScheme};
mod build;
mod load;
mod servers;
mod types;

pub use build::*;
pub use load::*;
pub use servers::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Spec {
        Spec::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "Petstore", "version": "1.0.0"},
            "servers": [
                {"url": "http://localhost:8080/v1"},
                {"url": "https://api.example.com/v1/"},
                {"url": "/"}
            ],
            "paths": {
                "/pets": {"get": {"operationId": "listPets", "summary": "List pets", "responses": {"200": {"description": "ok"}}}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn resolution_defaults_to_first_server() {
        let spec = petstore();
        let res = spec.resolve_server_url(None);
        assert_eq!(res.url, "http://localhost:8080/v1");
        assert_eq!(res.servers.len(), 3);
    }

    #[test]
    fn requested_url_is_appended_once() {
        let spec = petstore();
        let (spec, url) = spec.with_server_url(Some("http://other:9000/api/"));
        assert_eq!(url, "http://other:9000/api");
        assert_eq!(spec.servers().len(), 4);
        let (again, _) = spec.with_server_url(Some("http://other:9000/api"));
        assert_eq!(again.servers().len(), 4);
    }

    #[test]
    fn resolution_is_pure() {
        let spec = petstore();
        let _ = spec.resolve_server_url(Some("http://elsewhere"));
        assert_eq!(spec.servers().len(), 3);
    }

    #[test]
    fn base_paths_are_deduplicated() {
        assert_eq!(petstore().base_paths(), ["/v1", ""]);
    }

    #[test]
    fn relative_paths_on_segment_boundary() {
        let spec = petstore();
        assert_eq!(spec.relative_paths("/v1/pets"), ["/pets", "/v1/pets"]);
        assert_eq!(spec.relative_paths("/v10/pets"), ["/v10/pets"]);
    }

    #[test]
    fn field_access_tries_camel_case() {
        let spec = petstore();
        assert_eq!(spec.field("openapi"), Some(&json!("3.0.0")));
        let op = spec.operation("listPets").unwrap();
        assert_eq!(op.field("operation_id"), Some(&json!("listPets")));
        assert_eq!(op.doc(), "List pets");
    }

    #[test]
    fn documents_without_servers_resolve_to_root() {
        let spec = Spec::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {"/x": {"get": {"operationId": "x", "responses": {}}}}
        }))
        .unwrap();
        assert_eq!(spec.resolve_server_url(None).url, "/");
        assert_eq!(spec.base_paths(), [""]);
    }
}
