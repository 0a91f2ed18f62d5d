use anyhow::{Context, Result};
use tracing::info;

use crate::provider::{ProviderClient, RetryPolicy, API_KEY_ENV};
use crate::runtime;

pub async fn run_healthcheck(
    base_url: String,
    api_key: Option<String>,
    no_retry: bool,
) -> Result<()> {
    let models = runtime::resolved_config();
    let model = &models.healthcheck_model_id;

    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .with_context(|| format!("{} is not set", API_KEY_ENV))?;

    let mut client = ProviderClient::new(&base_url, api_key)?;
    if no_retry {
        client = client.with_retry(RetryPolicy::none());
    }

    info!(
        "🩺 Checking provider at {} with model {} ({})",
        client.base_url(),
        model,
        models.healthcheck_source.describe()
    );

    let result = client
        .ping(model)
        .await
        .with_context(|| format!("Healthcheck failed for model {}", model))?;

    println!("✅ Model provider reachable");
    println!("   Model: {}", result.requested_model);
    if let Some(served) = result.served_model.as_deref() {
        if served != result.requested_model {
            println!("   Served by: {}", served);
        }
    }
    if let Some(id) = result.completion_id.as_deref() {
        println!("   Completion: {}", id);
    }
    println!("   Latency: {} ms", result.latency.as_millis());

    Ok(())
}
