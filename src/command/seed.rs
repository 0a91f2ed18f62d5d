use std::path::PathBuf;

use anyhow::Result;
use tracing::error;

use crate::cli::{self, LoaderArgs};
use crate::seed::{self, ContentSeeder, ScriptSeeder, SeedOptions};
use crate::startup::{EntryPointLocator, NodeStrategy};

/// Run the content seeder. Returns the process exit code.
pub async fn run_seed(script: PathBuf, enforce_counts: bool, loader: LoaderArgs) -> Result<i32> {
    let project_root = cli::resolve_project_root(loader.project_root)?;
    let strategy = NodeStrategy::new(loader.strategy, project_root).with_node_binary(loader.node);

    let result = match ScriptSeeder::new(strategy, EntryPointLocator::new(script)) {
        Ok(seeder) => {
            seeder
                .ensure_core_learning_content(SeedOptions { enforce_counts })
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            println!("✅ Core learning content is in place");
            println!("   {}", seed::summarize(&report));
            Ok(0)
        }
        Err(e) => {
            error!("Content seeding failed: {}", e);
            Ok(1)
        }
    }
}
