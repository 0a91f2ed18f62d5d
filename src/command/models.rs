use anyhow::{Context, Result};

use crate::config::ResolvedConfig;
use crate::runtime;

pub fn run_models(json: bool) -> Result<()> {
    let resolved = runtime::resolved_config();

    if json {
        let out = serde_json::to_string_pretty(resolved).context("Failed to serialize models")?;
        println!("{}", out);
    } else {
        print!("{}", render(resolved));
    }

    Ok(())
}

fn render(resolved: &ResolvedConfig) -> String {
    format!(
        "Chat model:        {}  (from {})\nHealthcheck model: {}  (from {})\n",
        resolved.chat_model_id,
        resolved.chat_source.describe(),
        resolved.healthcheck_model_id,
        resolved.healthcheck_source.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigInputs, LEGACY_CHAT_MODEL_ENV};

    #[test]
    fn test_render_names_sources() {
        let inputs = ConfigInputs::from_pairs([(LEGACY_CHAT_MODEL_ENV, "legacy-model")]);
        let text = render(&ResolvedConfig::resolve(&inputs));
        assert!(text.contains("Chat model:        legacy-model  (from AI_TUTOR_MODEL)"));
        assert!(text.contains("Healthcheck model: legacy-model  (from AI_TUTOR_MODEL)"));
    }
}
