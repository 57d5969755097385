use crate::dispatcher::Endpoint;
use crate::error::ConfigError;
use crate::registry::fold_identifier;
use std::collections::{BTreeMap, HashMap};

/// Named namespace of endpoints, with nested submodules.
///
/// Operation ids are resolved against a base module: `listPets` names the
/// function `list_pets` in the base module and `pets.admin.purge` names
/// `purge` in the `pets.admin` submodule.
///
/// ```rust
/// use oasbind::dispatcher::Endpoint;
/// use oasbind::server::EndpointModule;
/// use serde_json::json;
///
/// let pets = EndpointModule::new("pets")
///     .endpoint(Endpoint::sync("list_pets", |_req| json!({"items": []})));
/// let api = EndpointModule::new("api").submodule(pets);
///
/// assert!(api.module_at("pets").is_some());
/// assert!(api.module_at("pets").unwrap().function("list_pets").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EndpointModule {
    name: String,
    functions: HashMap<String, Endpoint>,
    submodules: BTreeMap<String, EndpointModule>,
}

impl EndpointModule {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an endpoint under its own name.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.functions.insert(endpoint.name().to_string(), endpoint);
        self
    }

    #[must_use]
    pub fn submodule(mut self, module: EndpointModule) -> Self {
        self.submodules.insert(module.name.clone(), module);
        self
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Endpoint> {
        self.functions.get(name)
    }

    /// Submodule at a dotted path relative to this module.
    #[must_use]
    pub fn module_at(&self, dotted: &str) -> Option<&EndpointModule> {
        dotted
            .split('.')
            .try_fold(self, |module, part| module.submodules.get(part))
    }

    /// Find the endpoint an operation id names.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownModule`] for a missing submodule,
    /// [`ConfigError::UnknownFunction`] for a missing function.
    pub fn resolve(&self, operation_id: &str, enforce_case: bool) -> Result<&Endpoint, ConfigError> {
        let (module, module_name, function) = match operation_id.rsplit_once('.') {
            Some((path, function)) => {
                let full = format!("{}.{}", self.name, path);
                let module = self
                    .module_at(path)
                    .ok_or_else(|| ConfigError::UnknownModule(full.clone()))?;
                (module, full, function)
            }
            None => (self, self.name.clone(), operation_id),
        };
        let function = if enforce_case {
            fold_identifier(function)
        } else {
            function.to_string()
        };
        module
            .function(&function)
            .ok_or_else(|| ConfigError::UnknownFunction(format!("{module_name}.{function}")))
    }
}
