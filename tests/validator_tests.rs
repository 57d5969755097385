#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{endpoints, fixtures};
use http::StatusCode;
use oasbind::client::{Call, Client};
use oasbind::gateway::{IncomingRequest, OpenApiRequest, OpenApiResponse};
use oasbind::server::{Application, LocalTransport};
use oasbind::spec::Spec;
use oasbind::validator::{IssueKind, SchemaValidator, ValidationIssue, ValidationVerdict, Validator};
use oasbind::validator_cache::ValidatorCache;
use oasbind::ClientError;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Rejects requests carrying `x-reject` and counts every check.
#[derive(Default)]
struct Counting {
    requests: AtomicUsize,
    responses: AtomicUsize,
}

impl Validator for Counting {
    fn validate_request(&self, _spec: &Spec, request: &OpenApiRequest) -> ValidationVerdict {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if request.header("x-reject").is_some() {
            return ValidationVerdict::from_issues(vec![ValidationIssue::new(
                "header.x-reject",
                IssueKind::InvalidParameter,
                "rejected",
            )]);
        }
        ValidationVerdict::valid()
    }

    fn validate_response(&self, _spec: &Spec, _request: &OpenApiRequest, _response: &OpenApiResponse) -> ValidationVerdict {
        self.responses.fetch_add(1, Ordering::SeqCst);
        ValidationVerdict::valid()
    }
}

#[test]
fn test_precompile_covers_every_schema() {
    let spec = fixtures::spec();
    let cache = ValidatorCache::new(true);
    // Three parameters, one request body, five response bodies.
    assert_eq!(cache.precompile(&spec), 9);
    assert_eq!(cache.size(), 9);

    let validator = SchemaValidator::new(cache.clone());
    let request = OpenApiRequest::get("/test-async?limit=2");
    assert!(validator.validate_request(&spec, &request).is_valid());
    let response = OpenApiResponse::json(StatusCode::OK, &json!({"baz": 1}));
    assert!(validator.validate_response(&spec, &request, &response).is_valid());
    assert_eq!(cache.size(), 9);
}

#[test]
fn test_base_path_requests_resolve() {
    let spec = fixtures::spec();
    let validator = SchemaValidator::default();

    let by_path = OpenApiRequest::get("/v2/test/abc");
    assert!(validator.validate_request(&spec, &by_path).is_valid());

    let by_pattern = OpenApiRequest::get("/v2/test/abc").with_path_pattern("/v2/test/{test_arg}");
    assert!(validator.validate_request(&spec, &by_pattern).is_valid());

    let verdict = validator.validate_request(&spec, &OpenApiRequest::get("/v3/test"));
    assert_eq!(verdict.errors[0].kind, IssueKind::PathNotFound);
}

#[test]
fn test_security_issue_is_flagged() {
    let spec = fixtures::spec();
    let validator = SchemaValidator::default();
    let verdict = validator.validate_request(&spec, &OpenApiRequest::get("/secure"));
    assert!(verdict.is_security_failure());
    assert!(verdict.errors[0].message.contains("api_key"));

    let keyed = OpenApiRequest::get("/secure").with_header("X-API-Key", "k");
    assert!(validator.validate_request(&spec, &keyed).is_valid());
}

#[test]
fn test_custom_validator_on_both_sides() {
    let server_side = Arc::new(Counting::default());
    let app = Application::builder(fixtures::spec())
        .module(endpoints::module())
        .validator(Arc::clone(&server_side) as Arc<dyn Validator>)
        .build()
        .unwrap();

    let client_side = Arc::new(Counting::default());
    let client = Client::builder(fixtures::spec())
        .transport(Arc::new(LocalTransport::new(Arc::new(app))))
        .validator(Arc::clone(&client_side) as Arc<dyn Validator>)
        .build()
        .unwrap();

    // The custom validator does not check credentials.
    let response = client.call("secure_endpoint", Call::new()).unwrap();
    assert_eq!(response.payload(), json!({"foo": "secret"}));
    assert_eq!(client_side.requests.load(Ordering::SeqCst), 1);
    assert_eq!(client_side.responses.load(Ordering::SeqCst), 1);
    assert_eq!(server_side.requests.load(Ordering::SeqCst), 1);
    assert_eq!(server_side.responses.load(Ordering::SeqCst), 1);

    let err = client
        .call("dummy_test_endpoint", Call::new().header("X-Reject", "1"))
        .unwrap_err();
    assert!(matches!(err, ClientError::RequestValidation(_)));
    // Rejected before reaching the server.
    assert_eq!(server_side.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_rejection_uses_issue_details() {
    let app = Application::builder(fixtures::spec())
        .module(endpoints::module())
        .validator(Arc::new(Counting::default()))
        .build()
        .unwrap();
    let response = app
        .handle(IncomingRequest::get("/test").with_header("X-Reject", "yes"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.payload()["details"],
        json!([{"kind": "InvalidParameter", "location": "header.x-reject", "message": "rejected"}])
    );
}
