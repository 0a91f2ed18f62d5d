use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{self, LoaderArgs};
use crate::config::{CHAT_MODEL_ENV, HEALTHCHECK_MODEL_ENV};
use crate::runtime;
use crate::startup::{
    bootstrap, report_failure, report_startup_error, BootstrapError, BootstrapOutcome,
    EntryPointLocator, NodeStrategy,
};

/// Bootstrap the server entry point. Returns the process exit code.
pub async fn run_serve(entry: PathBuf, loader: LoaderArgs) -> Result<i32> {
    if !runtime::claim_bootstrap() {
        let err = BootstrapError::AlreadyBootstrapped;
        report_failure(&err);
        return Ok(err.exit_code());
    }

    let project_root = match cli::resolve_project_root(loader.project_root) {
        Ok(root) => root,
        Err(e) => {
            report_startup_error(format!("{:#}", e));
            return Ok(1);
        }
    };

    let models = runtime::resolved_config();
    info!("🧭 Project root: {}", project_root.display());
    info!(
        "   Chat model: {} ({})",
        models.chat_model_id,
        models.chat_source.describe()
    );
    if models.has_dedicated_healthcheck() {
        info!("   Healthcheck model: {}", models.healthcheck_model_id);
    }

    // The entry point sees the same ids this process resolved.
    let mut strategy = NodeStrategy::new(loader.strategy, project_root)
        .with_node_binary(loader.node)
        .with_env(CHAT_MODEL_ENV, &models.chat_model_id)
        .with_env(HEALTHCHECK_MODEL_ENV, &models.healthcheck_model_id);
    debug!(
        "Exporting {}={} {}={} to entry point",
        CHAT_MODEL_ENV, models.chat_model_id, HEALTHCHECK_MODEL_ENV, models.healthcheck_model_id
    );

    let outcome = bootstrap(&mut strategy, &EntryPointLocator::new(entry)).await;
    if let BootstrapOutcome::Started(exit) = &outcome {
        debug!("Entry point finished with {}", exit);
    }

    Ok(outcome.exit_code())
}
