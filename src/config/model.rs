//! Model identifier resolution.
//!
//! Precedence for the chat model:
//! 1. `OPENAI_CHAT_MODEL`
//! 2. `AI_TUTOR_MODEL` (legacy)
//! 3. [`DEFAULT_CHAT_MODEL`]
//!
//! The healthcheck model checks `OPENAI_HEALTHCHECK_MODEL` first and otherwise
//! follows the chat model, so health checks run against whatever normal traffic uses
//! unless an operator points them elsewhere.
//!
//! A value that is empty after trimming is treated as absent.

use serde::Serialize;
use tracing::debug;

use super::{ConfigInputs, CHAT_MODEL_ENV, HEALTHCHECK_MODEL_ENV, LEGACY_CHAT_MODEL_ENV};

/// Model used when no override is set.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-5.2";

/// Where a resolved model id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// `OPENAI_CHAT_MODEL`
    Primary,
    /// `AI_TUTOR_MODEL`
    Legacy,
    /// `OPENAI_HEALTHCHECK_MODEL`
    Healthcheck,
    /// Built-in default
    Default,
}

impl ModelSource {
    /// Human-readable label, naming the variable when there is one.
    pub fn describe(&self) -> &'static str {
        match self {
            ModelSource::Primary => CHAT_MODEL_ENV,
            ModelSource::Legacy => LEGACY_CHAT_MODEL_ENV,
            ModelSource::Healthcheck => HEALTHCHECK_MODEL_ENV,
            ModelSource::Default => "built-in default",
        }
    }
}

fn chat_model_with_source(inputs: &ConfigInputs) -> (String, ModelSource) {
    if let Some(model) = inputs.non_blank(CHAT_MODEL_ENV) {
        return (model.to_string(), ModelSource::Primary);
    }
    if let Some(model) = inputs.non_blank(LEGACY_CHAT_MODEL_ENV) {
        return (model.to_string(), ModelSource::Legacy);
    }
    (DEFAULT_CHAT_MODEL.to_string(), ModelSource::Default)
}

fn healthcheck_model_with_source(inputs: &ConfigInputs) -> (String, ModelSource) {
    match inputs.non_blank(HEALTHCHECK_MODEL_ENV) {
        Some(model) => (model.to_string(), ModelSource::Healthcheck),
        None => chat_model_with_source(inputs),
    }
}

/// Resolve the model id used for chat traffic. Never empty.
pub fn resolve_chat_model(inputs: &ConfigInputs) -> String {
    chat_model_with_source(inputs).0
}

/// Resolve the model id used for healthcheck calls. Never empty.
pub fn resolve_healthcheck_model(inputs: &ConfigInputs) -> String {
    healthcheck_model_with_source(inputs).0
}

/// Both model ids, resolved from one snapshot of inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub chat_model_id: String,
    pub healthcheck_model_id: String,
    pub chat_source: ModelSource,
    pub healthcheck_source: ModelSource,
}

impl ResolvedConfig {
    pub fn resolve(inputs: &ConfigInputs) -> Self {
        let (chat_model_id, chat_source) = chat_model_with_source(inputs);
        let (healthcheck_model_id, healthcheck_source) = healthcheck_model_with_source(inputs);

        debug!(
            "Resolved chat model '{}' from {}, healthcheck model '{}' from {}",
            chat_model_id,
            chat_source.describe(),
            healthcheck_model_id,
            healthcheck_source.describe()
        );

        Self {
            chat_model_id,
            healthcheck_model_id,
            chat_source,
            healthcheck_source,
        }
    }

    /// True when health checks use a model distinct from chat traffic.
    pub fn has_dedicated_healthcheck(&self) -> bool {
        self.healthcheck_source == ModelSource::Healthcheck
    }
}
