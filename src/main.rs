use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use tutorboot::cli::{Cli, Commands};
use tutorboot::command;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Commands::Serve { entry, loader } => command::run_serve(entry, loader).await?,
        Commands::Models { json } => {
            command::run_models(json)?;
            0
        }
        Commands::Healthcheck {
            base_url,
            api_key,
            no_retry,
        } => {
            command::run_healthcheck(base_url, api_key, no_retry).await?;
            0
        }
        Commands::Seed {
            script,
            enforce_counts,
            loader,
        } => command::run_seed(script, enforce_counts, loader).await?,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
