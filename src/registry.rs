//! Operation lookup by `operationId`, with optional snake_case folding.
//!
//! Lookup order is fixed: an exact match on the declared id wins; only then,
//! and only when case folding is enabled, the folded name is compared with
//! the folded form of every declared id.

use crate::error::RegistryError;
use crate::spec::{Operation, Spec};
use heck::ToSnakeCase;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Snake_case fold of an operation id.
///
/// Dots and dashes become underscores, so `pets.getPetById` folds to
/// `pets_get_pet_by_id`.
#[must_use]
pub fn fold_identifier(id: &str) -> String {
    id.split(['.', '-'])
        .map(ToSnakeCase::to_snake_case)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Declared operations addressable by id.
#[derive(Debug, Clone)]
pub struct OperationRegistry {
    operations: Vec<Arc<Operation>>,
    by_id: HashMap<String, usize>,
    by_folded: HashMap<String, usize>,
}

impl OperationRegistry {
    #[must_use]
    pub fn new(spec: &Spec) -> Self {
        let operations: Vec<Arc<Operation>> = spec.operations().to_vec();
        let mut by_id = HashMap::with_capacity(operations.len());
        let mut by_folded = HashMap::with_capacity(operations.len());
        for (idx, op) in operations.iter().enumerate() {
            by_id.insert(op.operation_id.clone(), idx);
            // First declaration wins when two ids fold to the same name.
            by_folded
                .entry(fold_identifier(&op.operation_id))
                .or_insert(idx);
        }
        Self {
            operations,
            by_id,
            by_folded,
        }
    }

    /// Operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Resolve a name to an operation.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownOperation`] when `name` is neither a declared
    /// id nor (with `enforce_case`) the fold of one.
    pub fn resolve(&self, name: &str, enforce_case: bool) -> Result<&Arc<Operation>, RegistryError> {
        if let Some(&idx) = self.by_id.get(name) {
            return Ok(&self.operations[idx]);
        }
        if enforce_case {
            if let Some(&idx) = self.by_folded.get(name) {
                let op = &self.operations[idx];
                debug!(requested = name, operation_id = %op.operation_id, "Operation resolved by folded name");
                return Ok(op);
            }
        }
        Err(RegistryError::UnknownOperation(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> Spec {
        Spec::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/pets/{id}": {"get": {"operationId": "getPetById", "responses": {}}},
                "/owners": {"get": {"operationId": "owners.listOwners", "responses": {}}},
                "/ping": {"get": {"operationId": "ping", "responses": {}}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn folding() {
        assert_eq!(fold_identifier("getPetById"), "get_pet_by_id");
        assert_eq!(fold_identifier("pets.getPetById"), "pets_get_pet_by_id");
        assert_eq!(fold_identifier("dummyTestEndpoint"), "dummy_test_endpoint");
        assert_eq!(fold_identifier("list-pets"), "list_pets");
        assert_eq!(fold_identifier("already_snake"), "already_snake");
    }

    #[test]
    fn exact_then_folded() {
        let reg = OperationRegistry::new(&spec());
        assert_eq!(reg.resolve("getPetById", false).unwrap().operation_id, "getPetById");
        assert_eq!(reg.resolve("get_pet_by_id", true).unwrap().operation_id, "getPetById");
        assert_eq!(reg.resolve("owners_list_owners", true).unwrap().operation_id, "owners.listOwners");
        assert!(reg.resolve("get_pet_by_id", false).is_err());
    }

    #[test]
    fn requested_names_are_not_folded() {
        let reg = OperationRegistry::new(&spec());
        assert!(reg.resolve("getPetByID", true).is_err());
        assert!(reg.resolve("GetPetById", true).is_err());
        assert!(reg.resolve("owners.list_owners", true).is_err());
    }

    #[test]
    fn unknown_operation_message() {
        let reg = OperationRegistry::new(&spec());
        let err = reg.resolve("nope", true).unwrap_err();
        assert_eq!(err.to_string(), "Unknown operationId: nope.");
        assert_eq!(reg.len(), 3);
    }
}
