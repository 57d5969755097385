#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod fixtures {
    use oasbind::spec::Spec;
    use serde_json::Value;
    use std::path::PathBuf;

    /// Path of a file under `tests/fixtures`.
    pub fn path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    /// The JSON fixture as a mutable document, for tests that tweak it.
    pub fn spec_dict() -> Value {
        let raw = std::fs::read_to_string(path("openapi.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    pub fn spec() -> Spec {
        Spec::from_value(spec_dict()).unwrap()
    }
}

pub mod temp_files {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Writes `content` into a fresh temp dir; the dir lives as long as the guard.
    pub fn write_spec(content: &str, file_name: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}

pub mod endpoints {
    use http::StatusCode;
    use oasbind::dispatcher::Endpoint;
    use oasbind::gateway::{IncomingRequest, OpenApiResponse};
    use oasbind::server::EndpointModule;
    use serde_json::{json, Value};

    pub fn dummy_test_endpoint(_req: IncomingRequest) -> Value {
        json!({"foo": "bar"})
    }

    pub fn dummy_test_endpoint_with_argument(req: IncomingRequest) -> Value {
        json!({"foo": req.path_param("test_arg")})
    }

    pub async fn dummy_test_endpoint_coro(_req: IncomingRequest) -> Value {
        json!({"baz": 123})
    }

    pub async fn dummy_post_endpoint(req: IncomingRequest) -> OpenApiResponse {
        if req.json() == Some(json!({"foo": "bar"})) {
            OpenApiResponse::new(StatusCode::NO_CONTENT)
        } else {
            OpenApiResponse::error(StatusCode::UNPROCESSABLE_ENTITY, "unexpected body", Vec::new())
        }
    }

    pub fn search_endpoint(req: IncomingRequest) -> Value {
        json!({"foo": req.query.get("q")})
    }

    pub fn secure_endpoint(_req: IncomingRequest) -> Value {
        json!({"foo": "secret"})
    }

    /// Every fixture operation, resolvable by folded name.
    pub fn module() -> EndpointModule {
        EndpointModule::new("endpoints")
            .endpoint(oasbind::endpoint!(dummy_test_endpoint))
            .endpoint(oasbind::endpoint!(dummy_test_endpoint_with_argument))
            .endpoint(oasbind::endpoint!(async dummy_test_endpoint_coro))
            .endpoint(oasbind::endpoint!(async dummy_post_endpoint))
            .endpoint(oasbind::endpoint!(search_endpoint))
            .endpoint(Endpoint::sync("secure_endpoint", secure_endpoint))
    }
}

pub mod transports {
    use oasbind::client::{Transport, TransportRequest, TransportResponse};
    use oasbind::error::TransportError;
    use std::sync::Mutex;

    /// Records every request and answers with a canned response.
    pub struct Recording {
        seen: Mutex<Vec<TransportRequest>>,
        reply: TransportResponse,
    }

    impl Recording {
        pub fn new(reply: TransportResponse) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply,
            }
        }

        pub fn requests(&self) -> Vec<TransportRequest> {
            self.seen.lock().unwrap().clone()
        }

        pub fn last(&self) -> TransportRequest {
            self.requests().pop().expect("no request was sent")
        }
    }

    impl Transport for Recording {
        fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }
}

pub mod apps {
    use super::{endpoints, fixtures};
    use oasbind::client::{Client, ClientBuilder};
    use oasbind::server::{Application, LocalTransport};
    use std::sync::Arc;

    /// The fixture application with every operation wired.
    pub fn application() -> Application {
        Application::builder(fixtures::spec())
            .module(endpoints::module())
            .build()
            .unwrap()
    }

    /// Client builder whose transport dispatches into [`application`].
    pub fn local_client() -> ClientBuilder {
        Client::builder(fixtures::spec())
            .transport(Arc::new(LocalTransport::new(Arc::new(application()))))
    }
}
