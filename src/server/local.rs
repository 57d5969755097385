use super::app::Application;
use crate::client::{Transport, TransportRequest, TransportResponse};
use crate::error::TransportError;
use std::sync::Arc;

/// In-process [`Transport`] that hands client requests to an [`Application`].
///
/// Each send blocks the calling thread until dispatch finishes, so it must
/// not be used from inside an async runtime worker.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    app: Arc<Application>,
}

impl LocalTransport {
    #[must_use]
    pub fn new(app: Arc<Application>) -> Self {
        Self { app }
    }

    #[must_use]
    pub fn application(&self) -> &Application {
        &self.app
    }
}

impl Transport for LocalTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut inbound = request.clone();
        // The server side only sees the path, as a real HTTP server would.
        inbound.host_url = String::new();
        inbound.path_pattern = None;
        inbound.path_params.clear();
        Ok(futures::executor::block_on(self.app.handle(inbound)))
    }
}
