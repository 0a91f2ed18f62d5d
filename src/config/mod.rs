//! Runtime configuration inputs.
//!
//! Environment variables are process-wide mutable state. They are read once,
//! here, into a [`ConfigInputs`] value that the resolvers take explicitly, so
//! the resolution logic stays pure and can be tested without touching the
//! real environment.

mod model;

pub use model::{
    resolve_chat_model, resolve_healthcheck_model, ModelSource, ResolvedConfig,
    DEFAULT_CHAT_MODEL,
};

use std::collections::HashMap;

/// Primary chat model override
pub const CHAT_MODEL_ENV: &str = "OPENAI_CHAT_MODEL";

/// Legacy chat model override, kept for older deployments
pub const LEGACY_CHAT_MODEL_ENV: &str = "AI_TUTOR_MODEL";

/// Dedicated override for healthcheck calls
pub const HEALTHCHECK_MODEL_ENV: &str = "OPENAI_HEALTHCHECK_MODEL";

/// Every variable the resolvers look at.
pub const MODEL_ENV_VARS: &[&str] = &[CHAT_MODEL_ENV, LEGACY_CHAT_MODEL_ENV, HEALTHCHECK_MODEL_ENV];

/// Immutable snapshot of named override inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInputs {
    values: HashMap<String, String>,
}

impl ConfigInputs {
    /// Snapshot the model override variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build inputs through an arbitrary lookup function.
    ///
    /// Only the names in [`MODEL_ENV_VARS`] are queried.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = MODEL_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name).map(|value| (name.to_string(), value)))
            .collect();
        Self { values }
    }

    /// Build inputs from explicit name/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values }
    }

    /// Raw value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Trimmed value for `name`; whitespace-only counts as absent.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }
}
