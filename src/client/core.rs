use super::request::{Call, CallBody};
use super::transport::{ReqwestTransport, Transport};
use crate::error::ClientError;
use crate::gateway::{OpenApiRequest, OpenApiResponse, ValidationGateway};
use crate::registry::fold_identifier;
use crate::spec::{base_path, is_json_mimetype, base_mimetype, load_spec, Operation, Spec};
use crate::validator::{SchemaValidator, Validator};
use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Bound callable for one operation.
#[derive(Debug, Clone)]
pub struct ClientOperation {
    operation: Arc<Operation>,
    name: String,
}

impl ClientOperation {
    fn new(operation: Arc<Operation>) -> Self {
        let name = fold_identifier(&operation.operation_id);
        Self { operation, name }
    }

    /// Folded name the operation is reachable under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation.operation_id
    }

    #[must_use]
    pub fn operation(&self) -> &Arc<Operation> {
        &self.operation
    }

    /// Summary (or id) followed by the description.
    #[must_use]
    pub fn doc(&self) -> String {
        self.operation.doc()
    }

    /// Build the transport-neutral request for a call without sending it.
    ///
    /// # Errors
    ///
    /// [`ClientError::Arity`] on a positional argument mismatch,
    /// [`ClientError::Encode`] when the body cannot be encoded.
    pub fn bind(&self, client: &Client, call: Call) -> Result<OpenApiRequest, ClientError> {
        let op = &self.operation;
        let encoded: Vec<String> = call
            .args
            .iter()
            .map(|arg| urlencoding::encode(arg).into_owned())
            .collect();
        let relative = op
            .template
            .build(&encoded)
            .map_err(|source| ClientError::Arity {
                operation_id: op.operation_id.clone(),
                source,
            })?;

        let mut headers: HashMap<String, String> = client.headers.clone();
        for (name, value) in call.headers {
            headers.insert(name.to_ascii_lowercase(), value);
        }
        let explicit_mimetype = headers.remove("content-type");

        let mut request = OpenApiRequest::from_path(op.method.clone(), format!("{}{}", client.base_path, relative))
            .with_host_url(client.host_url.clone())
            .with_path_pattern(format!("{}{}", client.base_path, op.path));
        request.query = call.query;
        request.path_params = op
            .template
            .variables()
            .iter()
            .cloned()
            .zip(call.args)
            .collect();
        for (name, value) in headers {
            request.insert_header(&name, value);
        }

        if let Some(body) = call.body {
            let (bytes, mimetype) = encode_body(op, body, explicit_mimetype)?;
            request = request.with_body(bytes, mimetype);
        } else if let Some(mimetype) = explicit_mimetype {
            request.insert_header("content-type", mimetype);
        }
        Ok(request)
    }

    /// Perform the call: bind, validate the request, send, check the
    /// status, validate the response.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; nothing is sent when binding or request
    /// validation fails.
    pub fn call(&self, client: &Client, call: Call) -> Result<OpenApiResponse, ClientError> {
        let op = &self.operation;
        let request = self.bind(client, call)?;
        client
            .gateway
            .check_request(&client.spec, &request)
            .map_err(ClientError::RequestValidation)?;

        let start = Instant::now();
        debug!(
            operation_id = %op.operation_id,
            method = %request.method,
            url = %request.url(),
            "Sending request"
        );
        let response = client.transport.send(&request)?;
        let latency_ms = start.elapsed().as_millis();

        if !response.is_success() {
            warn!(
                operation_id = %op.operation_id,
                status = response.status.as_u16(),
                latency_ms,
                "Request failed with non-success status"
            );
            return Err(ClientError::Status {
                status: response.status,
                body: response.body,
            });
        }
        client
            .gateway
            .check_response(&client.spec, &request, &response)
            .map_err(ClientError::ResponseValidation)?;

        info!(
            operation_id = %op.operation_id,
            status = response.status.as_u16(),
            latency_ms,
            "Request completed"
        );
        Ok(response)
    }
}

fn encode_body(
    op: &Operation,
    body: CallBody,
    explicit_mimetype: Option<String>,
) -> Result<(Bytes, String), ClientError> {
    let (value, mimetype) = match body {
        CallBody::Raw { bytes, mimetype } => {
            return Ok((bytes, explicit_mimetype.unwrap_or(mimetype)));
        }
        CallBody::Json(value) => {
            let mimetype = explicit_mimetype
                .or_else(|| {
                    op.request_body
                        .as_ref()
                        .and_then(|b| b.media_types().next().map(str::to_string))
                })
                .unwrap_or_else(|| "application/json".to_string());
            (value, mimetype)
        }
    };

    if is_json_mimetype(&mimetype) {
        let bytes = serde_json::to_vec(&value).map_err(|e| ClientError::Encode {
            mimetype: mimetype.clone(),
            message: e.to_string(),
        })?;
        return Ok((Bytes::from(bytes), mimetype));
    }
    if base_mimetype(&mimetype) == "application/x-www-form-urlencoded" {
        let Value::Object(fields) = &value else {
            return Err(ClientError::Encode {
                mimetype,
                message: "form bodies must be JSON objects".into(),
            });
        };
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in fields {
            match v {
                Value::String(s) => ser.append_pair(k, s),
                other => ser.append_pair(k, &other.to_string()),
            };
        }
        return Ok((Bytes::from(ser.finish()), mimetype));
    }
    let text = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    Ok((Bytes::from(text), mimetype))
}

/// Client whose operations mirror the document's operations.
///
/// Built once; every call after that only reads shared state.
#[derive(Clone)]
pub struct Client {
    spec: Spec,
    server_url: String,
    host_url: String,
    base_path: String,
    transport: Arc<dyn Transport>,
    headers: HashMap<String, String>,
    gateway: ValidationGateway,
    operations: Vec<ClientOperation>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server_url", &self.server_url)
            .field("operations", &self.operations.len())
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl Client {
    #[must_use]
    pub fn builder(spec: Spec) -> ClientBuilder {
        ClientBuilder::new(spec)
    }

    /// Client for a document on disk, with default options.
    ///
    /// # Errors
    ///
    /// [`ClientError::Spec`] when the document cannot be loaded.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        Self::builder(load_spec(path)?).build()
    }

    /// Spec with the resolved server list.
    #[must_use]
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Folded names of every operation, in declaration order.
    #[must_use]
    pub fn operations(&self) -> Vec<&str> {
        self.operations.iter().map(ClientOperation::name).collect()
    }

    /// Look up an operation by declared id or folded name.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnknownOperation`] naming the requested name.
    pub fn operation(&self, name: &str) -> Result<&ClientOperation, ClientError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.operations[idx])
            .ok_or_else(|| ClientError::UnknownOperation(name.to_string()))
    }

    /// Call an operation by name.
    ///
    /// # Errors
    ///
    /// See [`ClientOperation::call`]; unknown names fail with
    /// [`ClientError::UnknownOperation`].
    pub fn call(&self, name: &str, call: Call) -> Result<OpenApiResponse, ClientError> {
        self.operation(name)?.call(self, call)
    }
}

/// Options for [`Client`].
pub struct ClientBuilder {
    spec: Spec,
    server_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    validator: Option<Arc<dyn Validator>>,
    headers: HashMap<String, String>,
    validate_responses: bool,
}

impl ClientBuilder {
    #[must_use]
    pub fn new(spec: Spec) -> Self {
        Self {
            spec,
            server_url: None,
            transport: None,
            validator: None,
            headers: HashMap::new(),
            validate_responses: true,
        }
    }

    /// Server to talk to; defaults to the first declared server.
    #[must_use]
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Transport to send requests with; defaults to [`ReqwestTransport`].
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validator to check requests and responses with; defaults to [`SchemaValidator`].
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Default header sent with every call.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (k, v) in headers {
            self.headers.insert(k.as_ref().to_ascii_lowercase(), v.into());
        }
        self
    }

    #[must_use]
    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// The default transport connects on first use; its setup failures
    /// surface from the first call as [`ClientError::Transport`].
    ///
    /// # Errors
    ///
    /// Currently infallible for valid specs.
    pub fn build(self) -> Result<Client, ClientError> {
        let (spec, server_url) = self.spec.with_server_url(self.server_url.as_deref());
        let (host_url, base) = split_server_url(&server_url);

        let operations: Vec<ClientOperation> = spec
            .operations()
            .iter()
            .map(|op| ClientOperation::new(Arc::clone(op)))
            .collect();
        let mut by_name = HashMap::with_capacity(operations.len() * 2);
        for (idx, op) in operations.iter().enumerate() {
            by_name.entry(op.name.clone()).or_insert(idx);
        }
        for (idx, op) in operations.iter().enumerate() {
            by_name.insert(op.operation_id().to_string(), idx);
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::default()),
        };
        let validator: Arc<dyn Validator> = match self.validator {
            Some(v) => v,
            None => Arc::new(SchemaValidator::default()),
        };

        info!(
            title = %spec.title(),
            server_url = %server_url,
            operations = operations.len(),
            validate_responses = self.validate_responses,
            "Client built"
        );
        Ok(Client {
            gateway: ValidationGateway::new(validator, self.validate_responses),
            spec,
            server_url,
            host_url,
            base_path: base,
            transport,
            headers: self.headers,
            operations,
            by_name,
        })
    }
}

/// Split a server URL into `scheme://authority` and base path.
///
/// Relative URLs (`/v1`) have an empty host part.
fn split_server_url(server_url: &str) -> (String, String) {
    match url::Url::parse(server_url) {
        Ok(u) if u.has_host() => {
            let host = u[..url::Position::BeforePath].to_string();
            (host, base_path(server_url))
        }
        _ => (String::new(), base_path(server_url)),
    }
}
