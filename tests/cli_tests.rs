#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use clap::Parser;
use common::fixtures;
use oasbind::cli::{run, Cli, Commands};

fn run_to_string(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    run(cli, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_operations_command() {
    let spec = fixtures::path("openapi.json");
    let out = run_to_string(&["oasbind", "operations", "--spec", spec.to_str().unwrap()]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines.contains(&"dummyTestEndpoint\tdummy_test_endpoint\tGET\t/test"));
    assert!(lines.contains(&"dummyPostEndpoint\tdummy_post_endpoint\tPOST\t/test-post"));
}

#[test]
fn test_routes_command() {
    let spec = fixtures::path("openapi.yaml");
    let out = run_to_string(&["oasbind", "routes", "-s", spec.to_str().unwrap()]);
    assert_eq!(out.lines().count(), 12);
    assert!(out.contains("GET /v2/test/{test_arg} -> dummyTestEndpointWithArgument"));
    assert!(out.contains("POST /test-post -> dummyPostEndpoint"));
}

#[test]
fn test_call_arguments_parse() {
    let cli = Cli::try_parse_from([
        "oasbind",
        "call",
        "--spec",
        "openapi.yaml",
        "--server-url",
        "http://localhost:8002/v2",
        "dummy_test_endpoint_with_argument",
        "abc",
        "--query",
        "limit=3",
        "--header",
        "X-API-Key=a=b",
        "--no-validate-responses",
    ])
    .unwrap();
    match cli.command {
        Commands::Call {
            server_url,
            operation,
            args,
            query,
            header,
            no_validate_responses,
            body,
            ..
        } => {
            assert_eq!(server_url.as_deref(), Some("http://localhost:8002/v2"));
            assert_eq!(operation, "dummy_test_endpoint_with_argument");
            assert_eq!(args, ["abc"]);
            assert_eq!(query, [("limit".to_string(), "3".to_string())]);
            assert_eq!(header, [("X-API-Key".to_string(), "a=b".to_string())]);
            assert!(no_validate_responses);
            assert!(body.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_bad_key_value_is_rejected() {
    let err = Cli::try_parse_from([
        "oasbind",
        "call",
        "--spec",
        "openapi.yaml",
        "dummy_test_endpoint",
        "--header",
        "no-separator",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("expected KEY=VALUE"));
}

#[test]
fn test_unknown_operation_fails_before_sending() {
    let spec = fixtures::path("openapi.json");
    let cli = Cli::try_parse_from([
        "oasbind",
        "call",
        "--spec",
        spec.to_str().unwrap(),
        "no_such_operation",
    ])
    .unwrap();
    let mut out = Vec::new();
    let err = run(cli, &mut out).unwrap_err();
    assert!(format!("{err:#}").contains("client has no operation `no_such_operation`"));
    assert!(out.is_empty());
}
