use super::{decode_param_value, IssueKind, ValidationIssue, ValidationVerdict, Validator};
use crate::gateway::{OpenApiRequest, OpenApiResponse};
use crate::security::{describe_requirements, is_authorized, SecurityProvider, SecurityProviders, SecurityRequest};
use crate::spec::{
    base_mimetype, find_media, is_json_mimetype, Operation, ParamSpec, ParameterLocation, Spec,
};
use crate::validator_cache::ValidatorCache;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// `jsonschema`-backed [`Validator`].
///
/// Security schemes are checked for credential presence; a
/// [`SecurityProvider`] registered under a scheme name additionally decides
/// whether those credentials are accepted.
#[derive(Clone, Default)]
pub struct SchemaValidator {
    cache: ValidatorCache,
    providers: SecurityProviders,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("cache", &self.cache)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SchemaValidator {
    #[must_use]
    pub fn new(cache: ValidatorCache) -> Self {
        Self {
            cache,
            providers: SecurityProviders::new(),
        }
    }

    /// Register a provider for a security scheme name.
    #[must_use]
    pub fn with_provider(mut self, scheme: impl Into<String>, provider: Arc<dyn SecurityProvider>) -> Self {
        self.providers.insert(scheme.into(), provider);
        self
    }

    #[must_use]
    pub fn with_providers(mut self, providers: SecurityProviders) -> Self {
        self.providers.extend(providers);
        self
    }

    #[must_use]
    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }

    #[allow(clippy::too_many_arguments)]
    fn check_schema(
        &self,
        spec: &Spec,
        operation: &Operation,
        kind: &str,
        status: Option<&str>,
        schema: &Value,
        instance: &Value,
        issue_kind: IssueKind,
        location: &str,
    ) -> Vec<ValidationIssue> {
        let validator = match self.cache.get_or_compile(
            spec.fingerprint(),
            &operation.operation_id,
            kind,
            status,
            schema,
        ) {
            Ok(v) => v,
            Err(e) => return vec![ValidationIssue::new(location, IssueKind::InvalidSchema, e)],
        };
        validator
            .iter_errors(instance)
            .map(|e| {
                let path = e.instance_path.to_string();
                let at = if path.is_empty() {
                    location.to_string()
                } else {
                    format!("{location}{path}")
                };
                ValidationIssue::new(at, issue_kind, e.to_string())
            })
            .collect()
    }

    fn check_security(&self, spec: &Spec, operation: &Operation, req: &OpenApiRequest) -> Vec<ValidationIssue> {
        if is_authorized(
            &operation.security,
            spec.security_schemes(),
            &self.providers,
            &SecurityRequest::from(req),
        ) {
            return Vec::new();
        }
        vec![ValidationIssue::new(
            format!("{} {}", operation.method, operation.path),
            IssueKind::Security,
            format!(
                "no security requirement satisfied (expected {})",
                describe_requirements(&operation.security)
            ),
        )]
    }

    fn raw_param_values<'r>(param: &ParamSpec, req: &'r OpenApiRequest) -> Vec<&'r str> {
        match param.location {
            ParameterLocation::Path => req.path_params.get(&param.name).map(String::as_str).into_iter().collect(),
            ParameterLocation::Query => req.query.get_all(&param.name),
            ParameterLocation::Header => req.header(&param.name).into_iter().collect(),
            ParameterLocation::Cookie => req.cookies.get(&param.name).map(String::as_str).into_iter().collect(),
        }
    }

    fn check_parameters(&self, spec: &Spec, operation: &Operation, req: &OpenApiRequest) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for param in &operation.parameters {
            let location = format!("{}.{}", param.location, param.name);
            let values = Self::raw_param_values(param, req);
            if values.is_empty() {
                if param.required {
                    issues.push(ValidationIssue::new(
                        location,
                        IssueKind::MissingParameter,
                        format!("required {} parameter `{}` is missing", param.location, param.name),
                    ));
                }
                continue;
            }
            let Some(schema) = &param.schema else {
                continue;
            };
            let decoded = decode_param_value(&values, Some(schema), param.style);
            let kind = format!("param:{location}");
            issues.extend(self.check_schema(
                spec,
                operation,
                &kind,
                None,
                schema,
                &decoded,
                IssueKind::InvalidParameter,
                &location,
            ));
        }
        issues
    }

    fn check_body(&self, spec: &Spec, operation: &Operation, req: &OpenApiRequest) -> Vec<ValidationIssue> {
        let Some(body_spec) = &operation.request_body else {
            return Vec::new();
        };
        let body = req.body.as_ref().filter(|b| !b.is_empty());
        let Some(body) = body else {
            if body_spec.required {
                return vec![ValidationIssue::new("body", IssueKind::MissingBody, "request body is required")];
            }
            return Vec::new();
        };
        let mimetype = req.mimetype.as_deref().unwrap_or("application/octet-stream");
        let Some((declared, schema)) = body_spec.media_type_for(mimetype) else {
            return vec![ValidationIssue::new(
                "body",
                IssueKind::InvalidMediaType,
                format!(
                    "media type `{}` is not accepted (expected one of: {})",
                    base_mimetype(mimetype),
                    body_spec.media_types().collect::<Vec<_>>().join(", ")
                ),
            )];
        };
        let Some(schema) = schema.filter(|_| is_json_mimetype(mimetype)) else {
            return Vec::new();
        };
        let instance: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                return vec![ValidationIssue::new(
                    "body",
                    IssueKind::InvalidBody,
                    format!("body is not valid JSON: {e}"),
                )]
            }
        };
        let kind = format!("request:{declared}");
        self.check_schema(spec, operation, &kind, None, schema, &instance, IssueKind::InvalidBody, "body")
    }
}

/// Resolve the operation a request targets.
///
/// With a path pattern the pattern is compared (after stripping a declared
/// base path) against operation templates; otherwise the concrete path is
/// matched against them.
pub(crate) fn find_operation<'s>(
    spec: &'s Spec,
    req: &OpenApiRequest,
) -> Result<&'s Arc<Operation>, ValidationIssue> {
    let location = format!("{} {}", req.method, req.path_pattern.as_deref().unwrap_or(&req.path));
    let candidates: Vec<&Arc<Operation>> = match req.path_pattern.as_deref() {
        Some(pattern) => {
            let relative = spec.relative_paths(pattern);
            spec.operations()
                .iter()
                .filter(|op| relative.contains(&op.path.as_str()))
                .collect()
        }
        None => {
            let relative = spec.relative_paths(&req.path);
            spec.operations()
                .iter()
                .filter(|op| relative.iter().any(|p| op.template.matches(p).is_some()))
                .collect()
        }
    };
    if candidates.is_empty() {
        return Err(ValidationIssue::new(location, IssueKind::PathNotFound, "no declared path matches the request"));
    }
    candidates
        .into_iter()
        .find(|op| op.method == req.method)
        .ok_or_else(|| {
            ValidationIssue::new(
                location,
                IssueKind::OperationNotFound,
                format!("method {} is not declared for this path", req.method),
            )
        })
}

impl Validator for SchemaValidator {
    fn validate_request(&self, spec: &Spec, req: &OpenApiRequest) -> ValidationVerdict {
        let operation = match find_operation(spec, req) {
            Ok(op) => op,
            Err(issue) => return ValidationVerdict::from_issues(vec![issue]),
        };
        // Path parameters are recovered here when the caller did not supply them.
        let mut owned;
        let req = if req.path_params.is_empty() && !operation.template.variables().is_empty() {
            owned = req.clone();
            if let Some(params) = spec
                .relative_paths(&req.path)
                .into_iter()
                .find_map(|p| operation.template.matches(p))
            {
                owned.path_params = params;
            }
            &owned
        } else {
            req
        };

        let mut issues = self.check_security(spec, operation, req);
        issues.extend(self.check_parameters(spec, operation, req));
        issues.extend(self.check_body(spec, operation, req));
        debug!(
            operation_id = %operation.operation_id,
            issues = issues.len(),
            "Request validated"
        );
        ValidationVerdict::from_issues(issues)
    }

    fn validate_response(
        &self,
        spec: &Spec,
        req: &OpenApiRequest,
        resp: &OpenApiResponse,
    ) -> ValidationVerdict {
        let operation = match find_operation(spec, req) {
            Ok(op) => op,
            Err(issue) => return ValidationVerdict::from_issues(vec![issue]),
        };
        let status = resp.status.as_u16();
        let Some(media) = operation.response_for(status) else {
            return ValidationVerdict::from_issues(vec![ValidationIssue::new(
                format!("response.{status}"),
                IssueKind::UnknownResponse,
                format!("status {status} is not documented for `{}`", operation.operation_id),
            )]);
        };
        if media.is_empty() || resp.body.is_empty() {
            return ValidationVerdict::valid();
        }
        let mimetype = resp.mimetype.as_deref().unwrap_or("application/json");
        let Some((declared, spec_entry)) = find_media(media, mimetype) else {
            return ValidationVerdict::from_issues(vec![ValidationIssue::new(
                format!("response.{status}"),
                IssueKind::InvalidMediaType,
                format!("media type `{}` is not documented", base_mimetype(mimetype)),
            )]);
        };
        let Some(schema) = spec_entry.schema.as_ref().filter(|_| is_json_mimetype(mimetype)) else {
            return ValidationVerdict::valid();
        };
        let instance: Value = match serde_json::from_slice(&resp.body) {
            Ok(v) => v,
            Err(e) => {
                return ValidationVerdict::from_issues(vec![ValidationIssue::new(
                    format!("response.{status}"),
                    IssueKind::InvalidResponseBody,
                    format!("body is not valid JSON: {e}"),
                )])
            }
        };
        let status_key = status.to_string();
        let kind = format!("response:{declared}");
        let location = format!("response.{status}");
        let issues = self.check_schema(
            spec,
            operation,
            &kind,
            Some(&status_key),
            schema,
            &instance,
            IssueKind::InvalidResponseBody,
            &location,
        );
        debug!(
            operation_id = %operation.operation_id,
            status,
            issues = issues.len(),
            "Response validated"
        );
        ValidationVerdict::from_issues(issues)
    }
}
