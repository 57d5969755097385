//! # Runtime Configuration Module
//!
//! Environment-driven defaults for the server half.
//!
//! ## Environment Variables
//!
//! ### `OASBIND_VALIDATE_RESPONSES`
//!
//! Validate endpoint responses against the document before returning them.
//! Default: `true`.
//!
//! ### `OASBIND_ENFORCE_CASE`
//!
//! Resolve endpoint names through the snake_case fold of operation ids
//! (`getPetById` ↔ `get_pet_by_id`). Default: `true`.
//!
//! ### `OASBIND_SCHEMA_CACHE`
//!
//! Cache compiled JSON Schema validators per operation. Default: `true`.
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`; anything else
//! falls back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use oasbind::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("validate responses: {}", config.validate_responses);
//! ```

use std::env;

/// Server options loaded from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub validate_responses: bool,
    pub enforce_case: bool,
    pub schema_cache: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            validate_responses: true,
            enforce_case: true,
            schema_cache: true,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| lookup(key).and_then(|v| parse_flag(&v)).unwrap_or(default);
        Self {
            validate_responses: flag("OASBIND_VALIDATE_RESPONSES", defaults.validate_responses),
            enforce_case: flag("OASBIND_ENFORCE_CASE", defaults.enforce_case),
            schema_cache: flag("OASBIND_SCHEMA_CACHE", defaults.schema_cache),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        assert_eq!(RuntimeConfig::from_lookup(|_| None), RuntimeConfig::default());
    }

    #[test]
    fn flags_are_parsed() {
        let vars: HashMap<&str, &str> = [
            ("OASBIND_VALIDATE_RESPONSES", "off"),
            ("OASBIND_ENFORCE_CASE", "0"),
            ("OASBIND_SCHEMA_CACHE", "maybe"),
        ]
        .into_iter()
        .collect();
        let config = RuntimeConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert!(!config.validate_responses);
        assert!(!config.enforce_case);
        assert!(config.schema_cache);
    }
}
