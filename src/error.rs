//! Error taxonomy shared by the client and server halves.
//!
//! Errors are grouped by when they happen:
//!
//! - **Configuration time** ([`SpecError`], [`ConfigError`]): raised while a
//!   [`Client`](crate::client::Client) or [`Application`](crate::server::Application)
//!   is being built. Nothing is partially wired when one of these is returned.
//! - **Per call** ([`ClientError`], [`TemplateError`], [`TransportError`]):
//!   local to one client call.
//! - **Per request** ([`DispatchError`], [`ValidationFault`]): local to one
//!   inbound request on the server.

use crate::validator::ValidationIssue;
use bytes::Bytes;
use http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// File extensions accepted by [`load_spec`](crate::spec::load_spec).
pub const ACCEPTED_SPEC_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Failure to load or parse an OpenAPI document.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The document lacks the structure every spec needs (`paths`, at least
    /// one operation carrying an `operationId`) or could not be decoded.
    #[error("malformed OpenAPI document: {0}")]
    Malformed(String),

    /// The file extension does not select a decoder.
    #[error(
        "unknown specification file type `{extension}` for {path}. Accepted types: {}",
        ACCEPTED_SPEC_EXTENSIONS.join(", ")
    )]
    UnknownFileType {
        /// Offending file.
        path: PathBuf,
        /// Extension found (empty when the file has none).
        extension: String,
    },

    /// The document could not be read from disk.
    #[error("failed to read specification {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its JSON/YAML did not decode.
    #[error("failed to decode specification {path}: {message}")]
    Decode {
        /// File that failed to decode.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// Two operations declare the same `operationId`.
    #[error("duplicate operationId `{operation_id}` declared by {first} and {second}")]
    DuplicateOperationId {
        /// The duplicated identifier.
        operation_id: String,
        /// `METHOD path` of the first declaration.
        first: String,
        /// `METHOD path` of the second declaration.
        second: String,
    },
}

/// Path template errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The number of positional values does not match the template variables.
    #[error("accepts {}", describe_arity(.expected))]
    ArityMismatch {
        /// Variable names in declaration order.
        expected: Vec<String>,
        /// Number of values supplied.
        given: usize,
    },
}

fn describe_arity(expected: &[String]) -> String {
    match expected.len() {
        0 => "no positional arguments".to_string(),
        1 => format!("1 positional argument: {}", expected[0]),
        n => format!("{n} positional arguments: {}", expected.join(", ")),
    }
}

/// Operation lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Neither the identifier nor its snake_case fold matched a declared id.
    #[error("Unknown operationId: {0}.")]
    UnknownOperation(String),
}

/// Configuration-time faults raised while building an [`Application`](crate::server::Application).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document itself is unusable.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// An endpoint was registered for an operation the document does not declare.
    #[error("Unknown operationId: {0}.")]
    UnknownOperation(String),

    /// A dotted operation id names a submodule that is not registered.
    #[error("The module `{0}` does not exist!")]
    UnknownModule(String),

    /// The resolved module has no endpoint with the derived function name.
    #[error("The function `{0}` does not exist!")]
    UnknownFunction(String),
}

impl From<RegistryError> for ConfigError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownOperation(id) => ConfigError::UnknownOperation(id),
        }
    }
}

/// Errors produced by a [`Transport`](crate::client::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request URL could not be parsed.
    #[error("invalid request url `{0}`")]
    InvalidUrl(String),

    /// The request could not be sent or the response could not be read.
    #[error("transport failure: {0}")]
    Send(String),
}

/// A failing verdict translated into a caller-visible fault.
///
/// Security failures and shape failures are kept apart because they map to
/// different outcomes (403 vs 400). Every variant carries the validator's
/// structured issues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFault {
    /// Missing or rejected credentials.
    #[error("Invalid security: {}", summarize(.0))]
    Security(Vec<ValidationIssue>),

    /// The request does not conform to the operation.
    #[error("Bad request: {}", summarize(.0))]
    Request(Vec<ValidationIssue>),

    /// The response does not conform to the operation.
    #[error("Invalid response: {}", summarize(.0))]
    Response(Vec<ValidationIssue>),
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFault {
    /// Structured issues reported by the validator.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ValidationFault::Security(issues)
            | ValidationFault::Request(issues)
            | ValidationFault::Response(issues) => issues,
        }
    }

    /// HTTP status a server reports for this fault.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ValidationFault::Security(_) => StatusCode::FORBIDDEN,
            ValidationFault::Request(_) => StatusCode::BAD_REQUEST,
            ValidationFault::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, stable message used in error bodies.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            ValidationFault::Security(_) => "Invalid security.",
            ValidationFault::Request(_) => "Bad request",
            ValidationFault::Response(_) => "Response validation failed",
        }
    }
}

/// Per-call client failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client has no operation with this name (neither exact nor folded).
    #[error("client has no operation `{0}`")]
    UnknownOperation(String),

    /// Positional arguments do not match the operation's path variables.
    #[error("Incorrect arguments: {operation_id} {source}")]
    Arity {
        /// Declared operation id.
        operation_id: String,
        /// Arity details.
        #[source]
        source: TemplateError,
    },

    /// The outbound request failed validation and was not sent.
    #[error("request validation failed: {0}")]
    RequestValidation(ValidationFault),

    /// The response failed validation.
    #[error("response validation failed: {0}")]
    ResponseValidation(ValidationFault),

    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Status {
        /// Status returned by the server.
        status: StatusCode,
        /// Raw response body, kept for diagnostics.
        body: Bytes,
    },

    /// The transport failed before a response was available.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request body could not be encoded for its media type.
    #[error("failed to encode request body as {mimetype}: {message}")]
    Encode {
        /// Target media type.
        mimetype: String,
        /// Encoder message.
        message: String,
    },

    /// The document could not be loaded while building the client.
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Per-request server failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request or response validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationFault),

    /// The endpoint returned something that is neither a JSON object nor a response.
    #[error(
        "The endpoint function `{endpoint}` must return either a JSON object or a Response, got {found}"
    )]
    ContractViolation {
        /// Endpoint name.
        endpoint: String,
        /// Kind of value that was returned.
        found: &'static str,
    },

    /// No route matches the request path.
    #[error("no route for {method} {path}")]
    NotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// A route matches the path but not the method.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },
}

impl DispatchError {
    /// HTTP status reported for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Validation(fault) => fault.status(),
            DispatchError::ContractViolation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}
