//! # Validation
//!
//! The [`Validator`] trait is the seam between dispatch and the schema engine.
//! A validator reports a [`ValidationVerdict`]: pass, or a list of structured
//! [`ValidationIssue`]s. It never decides what happens next; the
//! [`ValidationGateway`](crate::gateway::ValidationGateway) turns verdicts into
//! faults.
//!
//! [`SchemaValidator`] is the bundled implementation backed by `jsonschema`.

mod params;
mod schema;

pub use params::decode_param_value;
pub use schema::SchemaValidator;

use crate::gateway::{OpenApiRequest, OpenApiResponse};
use crate::spec::Spec;
use std::fmt;

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// No declared path matches the request.
    PathNotFound,
    /// The path exists but not for this method.
    OperationNotFound,
    /// No security alternative is satisfied.
    Security,
    MissingParameter,
    InvalidParameter,
    MissingBody,
    /// Body media type is not declared for the operation or response.
    InvalidMediaType,
    InvalidBody,
    /// Status code not documented (exact, range or `default`).
    UnknownResponse,
    InvalidResponseBody,
    /// A declared schema could not be compiled.
    InvalidSchema,
}

impl IssueKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::PathNotFound => "PathNotFound",
            IssueKind::OperationNotFound => "OperationNotFound",
            IssueKind::Security => "Security",
            IssueKind::MissingParameter => "MissingParameter",
            IssueKind::InvalidParameter => "InvalidParameter",
            IssueKind::MissingBody => "MissingBody",
            IssueKind::InvalidMediaType => "InvalidMediaType",
            IssueKind::InvalidBody => "InvalidBody",
            IssueKind::UnknownResponse => "UnknownResponse",
            IssueKind::InvalidResponseBody => "InvalidResponseBody",
            IssueKind::InvalidSchema => "InvalidSchema",
        }
    }

    #[must_use]
    pub fn is_security(&self) -> bool {
        matches!(self, IssueKind::Security)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Where the issue was found (`query.limit`, `body/name`, `GET /pets`).
    pub location: String,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        ValidationIssue {
            location: location.into(),
            kind,
            message: message.into(),
        }
    }

    /// JSON form used in error response bodies.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind.as_str(),
            "location": self.location,
            "message": self.message,
        })
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Result of a conformance check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationVerdict {
    /// A passing verdict.
    #[must_use]
    pub fn valid() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any issue concerns credentials.
    #[must_use]
    pub fn is_security_failure(&self) -> bool {
        self.errors.iter().any(|e| e.kind.is_security())
    }
}

/// Request/response conformance checker.
///
/// Implementations must be thread-safe; one instance is shared by every
/// call and every inbound request.
pub trait Validator: Send + Sync {
    /// Check an outbound (client) or inbound (server) request.
    fn validate_request(&self, spec: &Spec, request: &OpenApiRequest) -> ValidationVerdict;

    /// Check a response against the operation the request resolved to.
    fn validate_response(
        &self,
        spec: &Spec,
        request: &OpenApiRequest,
        response: &OpenApiResponse,
    ) -> ValidationVerdict;
}
