//! # Schema Validator Cache
//!
//! Compiling a JSON Schema is far more expensive than checking an instance
//! against it. [`ValidatorCache`] keeps compiled `jsonschema` validators and
//! shares them across requests behind `Arc`.
//!
//! ## Cache Key Structure
//!
//! Keys are formatted as `{fingerprint}:{operation_id}:{kind}:{status}`:
//! - `fingerprint`: content hash of the document ([`Spec::fingerprint`]), so
//!   two documents never share entries
//! - `operation_id`: the declared operation id
//! - `kind`: what the schema describes (`request:application/json`,
//!   `param:query.limit`, `response:application/json`)
//! - `status`: the response status key, omitted for request schemas
//!
//! The cache is read-mostly: lookups take a read lock, compilation takes the
//! write lock once per key. It can be disabled with `OASBIND_SCHEMA_CACHE=off`
//! (see [`RuntimeConfig`](crate::runtime_config::RuntimeConfig)), in which case
//! every lookup compiles afresh.

use crate::spec::Spec;
use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info};

/// Thread-safe cache of compiled JSON Schema validators.
#[derive(Clone)]
pub struct ValidatorCache {
    cache: Arc<RwLock<HashMap<String, Arc<Validator>>>>,
    enabled: bool,
}

impl std::fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("enabled", &self.enabled)
            .field("size", &self.size())
            .finish()
    }
}

impl Default for ValidatorCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ValidatorCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        debug!(enabled, "Initializing JSON Schema validator cache");
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            enabled,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn cache_key(fingerprint: &str, operation_id: &str, kind: &str, status: Option<&str>) -> String {
        match status {
            Some(s) => format!("{fingerprint}:{operation_id}:{kind}:{s}"),
            None => format!("{fingerprint}:{operation_id}:{kind}"),
        }
    }

    /// Get a cached validator or compile and cache a new one.
    ///
    /// # Errors
    ///
    /// The compiler's message when the schema is not a valid JSON Schema.
    pub fn get_or_compile(
        &self,
        fingerprint: &str,
        operation_id: &str,
        kind: &str,
        status: Option<&str>,
        schema: &Value,
    ) -> Result<Arc<Validator>, String> {
        if !self.enabled {
            return compile(schema).map(Arc::new);
        }

        let key = Self::cache_key(fingerprint, operation_id, kind, status);
        if let Some(validator) = self.cache.read().ok().and_then(|c| c.get(&key).cloned()) {
            debug!(cache_key = %key, "Schema validator cache hit");
            return Ok(validator);
        }

        let validator = match compile(schema) {
            Ok(v) => Arc::new(v),
            Err(e) => {
                error!(
                    operation_id,
                    kind,
                    status,
                    error = %e,
                    "Failed to compile JSON Schema"
                );
                return Err(e);
            }
        };

        // A poisoned lock only costs us the caching.
        if let Ok(mut cache) = self.cache.write() {
            if let Some(existing) = cache.get(&key) {
                return Ok(Arc::clone(existing));
            }
            cache.insert(key.clone(), Arc::clone(&validator));
            debug!(cache_key = %key, cache_size = cache.len(), "Schema validator compiled and cached");
        }
        Ok(validator)
    }

    /// Number of cached validators.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Compile every schema the document declares.
    ///
    /// Returns how many schemas compiled; schemas that fail are logged and
    /// reported again when a request reaches them.
    pub fn precompile(&self, spec: &Spec) -> usize {
        let mut compiled = 0;
        for op in spec.operations() {
            let id = op.operation_id.as_str();
            for param in &op.parameters {
                if let Some(schema) = &param.schema {
                    let kind = format!("param:{}.{}", param.location, param.name);
                    compiled += usize::from(self.get_or_compile(spec.fingerprint(), id, &kind, None, schema).is_ok());
                }
            }
            if let Some(body) = &op.request_body {
                for (mt, schema) in &body.content {
                    if let Some(schema) = schema {
                        let kind = format!("request:{mt}");
                        compiled += usize::from(self.get_or_compile(spec.fingerprint(), id, &kind, None, schema).is_ok());
                    }
                }
            }
            for (status, media) in &op.responses {
                for (mt, resp) in media {
                    if let Some(schema) = &resp.schema {
                        let kind = format!("response:{mt}");
                        compiled += usize::from(
                            self.get_or_compile(spec.fingerprint(), id, &kind, Some(status), schema)
                                .is_ok(),
                        );
                    }
                }
            }
        }
        info!(compiled, cache_size = self.size(), "Precompiled schema validators");
        compiled
    }
}

fn compile(schema: &Value) -> Result<Validator, String> {
    jsonschema::validator_for(schema).map_err(|e| e.to_string())
}
