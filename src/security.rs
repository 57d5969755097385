//! # Security
//!
//! Credential checks for the `security` requirements of an operation.
//!
//! A requirement list holds alternatives: the request is authorized when at
//! least one requirement is satisfied. A requirement is satisfied when every
//! scheme it names has credentials in the request and, when a
//! [`SecurityProvider`] is registered under the scheme name, the provider
//! accepts them. An empty requirement (`{}`) allows anonymous access.
//!
//! Where credentials are looked for:
//! - **apiKey**: the named header, query parameter or cookie
//! - **http**: `Authorization: <scheme> <credentials>` (`Bearer`, `Basic`, ...)
//! - **oauth2 / openIdConnect**: a bearer token in `Authorization`
//!
//! ```rust
//! use oasbind::security::{SecurityProvider, SecurityRequest};
//! use oasbind::spec::SecurityScheme;
//!
//! struct ApiKeyProvider { key: String }
//!
//! impl SecurityProvider for ApiKeyProvider {
//!     fn validate(&self, scheme: &SecurityScheme, _scopes: &[String], req: &SecurityRequest<'_>) -> bool {
//!         req.credential(scheme).is_some_and(|k| k == self.key)
//!     }
//! }
//! ```

use crate::gateway::{OpenApiRequest, QueryParams};
use crate::spec::{SecurityRequirement, SecurityScheme};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Credentials view of a request handed to providers.
#[derive(Debug, Clone, Copy)]
pub struct SecurityRequest<'a> {
    /// Request headers (lowercase keys)
    pub headers: &'a HashMap<String, String>,
    pub query: &'a QueryParams,
    pub cookies: &'a HashMap<String, String>,
}

impl<'a> From<&'a OpenApiRequest> for SecurityRequest<'a> {
    fn from(req: &'a OpenApiRequest) -> Self {
        Self {
            headers: &req.headers,
            query: &req.query,
            cookies: &req.cookies,
        }
    }
}

impl<'a> SecurityRequest<'a> {
    /// Token of an `Authorization: <scheme> <token>` header (scheme compared
    /// case-insensitively).
    #[must_use]
    pub fn authorization(&self, scheme: &str) -> Option<&'a str> {
        let value = self.headers.get("authorization")?;
        let (given, token) = value.split_once(' ')?;
        let token = token.trim();
        (given.eq_ignore_ascii_case(scheme) && !token.is_empty()).then_some(token)
    }

    /// Credentials for a scheme, wherever the scheme says they live.
    #[must_use]
    pub fn credential(&self, scheme: &SecurityScheme) -> Option<&'a str> {
        match scheme {
            SecurityScheme::ApiKey { name, location, .. } => {
                match location.to_ascii_lowercase().as_str() {
                    "header" => self
                        .headers
                        .get(&name.to_ascii_lowercase())
                        .map(String::as_str),
                    "query" => self.query.get(name),
                    "cookie" => self.cookies.get(name).map(String::as_str),
                    _ => None,
                }
            }
            SecurityScheme::Http { scheme, .. } => self.authorization(scheme),
            SecurityScheme::OAuth2 { .. } | SecurityScheme::OpenIdConnect { .. } => {
                self.authorization("bearer")
            }
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// Validates credentials for one named security scheme.
///
/// Providers are registered per scheme name and shared between requests.
pub trait SecurityProvider: Send + Sync {
    /// `true` when the credentials in `req` are accepted for `scheme` and
    /// grant every scope in `scopes`.
    fn validate(&self, scheme: &SecurityScheme, scopes: &[String], req: &SecurityRequest<'_>)
        -> bool;
}

impl<F> SecurityProvider for F
where
    F: Fn(&SecurityScheme, &[String], &SecurityRequest<'_>) -> bool + Send + Sync,
{
    fn validate(
        &self,
        scheme: &SecurityScheme,
        scopes: &[String],
        req: &SecurityRequest<'_>,
    ) -> bool {
        self(scheme, scopes, req)
    }
}

/// Accepts a fixed set of keys or tokens, ignoring scopes.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    keys: HashSet<String>,
}

impl StaticKeyProvider {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl SecurityProvider for StaticKeyProvider {
    fn validate(
        &self,
        scheme: &SecurityScheme,
        _scopes: &[String],
        req: &SecurityRequest<'_>,
    ) -> bool {
        req.credential(scheme)
            .is_some_and(|key| self.keys.contains(key))
    }
}

/// Providers keyed by security scheme name.
pub type SecurityProviders = HashMap<String, Arc<dyn SecurityProvider>>;

/// Whether any requirement alternative is satisfied. An empty list is public.
#[must_use]
pub fn is_authorized(
    requirements: &[SecurityRequirement],
    schemes: &HashMap<String, SecurityScheme>,
    providers: &SecurityProviders,
    req: &SecurityRequest<'_>,
) -> bool {
    if requirements.is_empty() {
        return true;
    }
    requirements.iter().any(|requirement| {
        requirement.0.iter().all(|(scheme_name, scopes)| {
            let Some(scheme) = schemes.get(scheme_name) else {
                debug!(scheme = %scheme_name, "Security scheme not declared");
                return false;
            };
            if req.credential(scheme).is_none() {
                debug!(scheme = %scheme_name, "No credentials for security scheme");
                return false;
            }
            providers
                .get(scheme_name)
                .map_or(true, |p| p.validate(scheme, scopes, req))
        })
    })
}

/// `name + name | name` rendering of the alternatives, for error messages.
#[must_use]
pub fn describe_requirements(requirements: &[SecurityRequirement]) -> String {
    requirements
        .iter()
        .map(|r| {
            if r.0.is_empty() {
                "anonymous".to_string()
            } else {
                r.0.keys().cloned().collect::<Vec<_>>().join(" + ")
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
