use crate::error::TransportError;
use crate::gateway::{OpenApiRequest, OpenApiResponse};
use bytes::Bytes;
use http::StatusCode;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::time::Duration;

/// Request handed to a [`Transport`]: the validated, transport-neutral request.
pub type TransportRequest = OpenApiRequest;
/// Response returned by a [`Transport`].
pub type TransportResponse = OpenApiResponse;

/// Sends a bound request and returns the raw response.
///
/// Implementations report only transport failures; non-success statuses are
/// responses like any other and are judged by the client.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// [`TransportError`] when no response could be obtained.
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Blocking HTTP transport backed by `reqwest`.
///
/// The underlying client is created on the first send, so constructing or
/// dropping a transport never touches the HTTP stack.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    timeout: Option<Duration>,
    client: OnceCell<reqwest::blocking::Client>,
}

impl ReqwestTransport {
    /// Transport with a request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            client: OnceCell::new(),
        }
    }

    /// Wrap an already configured client.
    #[must_use]
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            timeout: None,
            client: OnceCell::with_value(client),
        }
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        self.client.get_or_try_init(|| {
            let mut builder = reqwest::blocking::Client::builder();
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            builder
                .build()
                .map_err(|e| TransportError::Send(format!("HTTP client setup failed: {e}")))
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = request.url();
        let parsed = url::Url::parse(&url).map_err(|_| TransportError::InvalidUrl(url.clone()))?;

        let mut builder = self.client()?.request(request.method.clone(), parsed);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_vec());
        }

        let response = builder
            .send()
            .map_err(|e| TransportError::Send(e.to_string()))?;
        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| TransportError::Send(e.to_string()))?;
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body: Bytes = response
            .bytes()
            .map_err(|e| TransportError::Send(e.to_string()))?;

        let mut out = TransportResponse::new(status);
        out.mimetype = headers.get("content-type").cloned();
        out.headers = headers;
        out.body = body;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_urls_are_rejected() {
        let transport = ReqwestTransport::default();
        let err = transport
            .send(&OpenApiRequest::get("/pets"))
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(ref u) if u == "/pets"));
        // Rejected before the HTTP client is ever built.
        assert!(transport.client.get().is_none());
    }

    #[test]
    fn construction_is_lazy() {
        let transport = ReqwestTransport::with_timeout(Duration::from_secs(1));
        assert!(transport.client.get().is_none());
        drop(transport.clone());
    }
}
