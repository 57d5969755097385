#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::fixtures;
use common::temp_files;
use oasbind::spec::{load_spec, Spec};
use oasbind::SpecError;
use serde_json::json;

#[test]
fn test_load_json_and_yaml_agree() {
    let from_json = load_spec(fixtures::path("openapi.json")).unwrap();
    let from_yaml = load_spec(fixtures::path("openapi.yaml")).unwrap();
    assert_eq!(from_json.title(), "Test Spec");
    assert_eq!(from_yaml.title(), "Test Spec");

    let ids = |spec: &Spec| {
        let mut ids: Vec<String> = spec.operations().iter().map(|op| op.operation_id.clone()).collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&from_json), ids(&from_yaml));
}

#[test]
fn test_unknown_file_type() {
    let err = load_spec(fixtures::path("openapi.unknown")).unwrap_err();
    assert!(matches!(err, SpecError::UnknownFileType { .. }));
    assert!(err.to_string().contains("Accepted types: json, yaml, yml"));
}

#[test]
fn test_yml_extension() {
    let content = std::fs::read_to_string(fixtures::path("openapi.yaml")).unwrap();
    let (_dir, path) = temp_files::write_spec(&content, "openapi.yml");
    assert_eq!(load_spec(&path).unwrap().operations().len(), 6);
}

#[test]
fn test_malformed_documents() {
    let err = Spec::from_value(json!({"openapi": "3.0.0", "info": {"title": "x", "version": "1"}}))
        .unwrap_err();
    assert!(matches!(err, SpecError::Malformed(_)));

    let mut no_ids = fixtures::spec_dict();
    for item in no_ids["paths"].as_object_mut().unwrap().values_mut() {
        for op in item.as_object_mut().unwrap().values_mut() {
            op.as_object_mut().unwrap().remove("operationId");
        }
    }
    assert!(matches!(Spec::from_value(no_ids), Err(SpecError::Malformed(_))));

    let (_dir, path) = temp_files::write_spec("{ not json", "broken.json");
    assert!(matches!(load_spec(&path), Err(SpecError::Decode { .. })));
}

#[test]
fn test_duplicate_operation_id() {
    let mut spec = fixtures::spec_dict();
    spec["paths"]["/test-async"]["get"]["operationId"] = json!("dummyTestEndpoint");
    match Spec::from_value(spec).unwrap_err() {
        SpecError::DuplicateOperationId { operation_id, .. } => {
            assert_eq!(operation_id, "dummyTestEndpoint");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_refs_are_expanded() {
    let spec = fixtures::spec();
    let op = spec.operation("dummyPostEndpoint").unwrap();
    let body = op.request_body.as_ref().unwrap();
    assert!(body.required);
    let (_, schema) = body.media_type_for("application/json").unwrap();
    assert_eq!(schema.unwrap()["required"], json!(["foo"]));
}

#[test]
fn test_global_and_operation_security() {
    let mut doc = fixtures::spec_dict();
    doc["security"] = json!([{"api_key": []}]);
    doc["paths"]["/test"]["get"]["security"] = json!([]);
    let spec = Spec::from_value(doc).unwrap();

    assert!(spec.operation("dummyTestEndpoint").unwrap().security.is_empty());
    assert_eq!(spec.operation("dummyTestEndpointCoro").unwrap().security.len(), 1);
}

#[test]
fn test_server_resolution() {
    let spec = fixtures::spec();
    assert_eq!(spec.base_paths(), vec!["".to_string(), "/v2".to_string()]);
    assert_eq!(spec.relative_paths("/v2/test"), vec!["/test", "/v2/test"]);

    let (_, url) = spec.with_server_url(None);
    assert_eq!(url, "http://localhost:8001");

    let (extended, url) = spec.with_server_url(Some("http://localhost:9000/extra/"));
    assert_eq!(url, "http://localhost:9000/extra");
    assert_eq!(extended.servers().len(), 3);
    assert_eq!(spec.servers().len(), 2);
}
