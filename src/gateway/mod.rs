//! # Validation Gateway
//!
//! Transport-neutral request/response types and the [`ValidationGateway`],
//! which runs a [`Validator`] and translates failing verdicts into
//! [`ValidationFault`]s.
//!
//! Request validation always runs. Response validation can be switched off,
//! in which case responses pass through untouched.

mod request;
mod response;

pub use request::{parse_cookies, IncomingRequest, OpenApiRequest, QueryParams};
pub use response::OpenApiResponse;

use crate::error::ValidationFault;
use crate::spec::Spec;
use crate::validator::Validator;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs the validator around a call and decides what a verdict means.
#[derive(Clone)]
pub struct ValidationGateway {
    validator: Arc<dyn Validator>,
    validate_responses: bool,
}

impl std::fmt::Debug for ValidationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationGateway")
            .field("validate_responses", &self.validate_responses)
            .finish_non_exhaustive()
    }
}

impl ValidationGateway {
    #[must_use]
    pub fn new(validator: Arc<dyn Validator>, validate_responses: bool) -> Self {
        Self {
            validator,
            validate_responses,
        }
    }

    #[must_use]
    pub fn validates_responses(&self) -> bool {
        self.validate_responses
    }

    /// Validate a request.
    ///
    /// # Errors
    ///
    /// [`ValidationFault::Security`] when any issue concerns credentials,
    /// otherwise [`ValidationFault::Request`].
    pub fn check_request(&self, spec: &Spec, request: &OpenApiRequest) -> Result<(), ValidationFault> {
        let verdict = self.validator.validate_request(spec, request);
        if verdict.is_valid() {
            debug!(method = %request.method, path = %request.path, "Request validation passed");
            return Ok(());
        }
        warn!(
            method = %request.method,
            path = %request.path,
            security = verdict.is_security_failure(),
            issues = ?verdict.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Request validation failed"
        );
        if verdict.is_security_failure() {
            Err(ValidationFault::Security(verdict.errors))
        } else {
            Err(ValidationFault::Request(verdict.errors))
        }
    }

    /// Validate a response; a no-op when response validation is disabled.
    ///
    /// # Errors
    ///
    /// [`ValidationFault::Response`] on a failing verdict.
    pub fn check_response(
        &self,
        spec: &Spec,
        request: &OpenApiRequest,
        response: &OpenApiResponse,
    ) -> Result<(), ValidationFault> {
        if !self.validate_responses {
            return Ok(());
        }
        let verdict = self.validator.validate_response(spec, request, response);
        if verdict.is_valid() {
            return Ok(());
        }
        warn!(
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            issues = ?verdict.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Response validation failed"
        );
        Err(ValidationFault::Response(verdict.errors))
    }
}
