use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::startup::LoaderHook;

/// tutorboot - launcher and model-config resolver for the AI tutor service
#[derive(Parser)]
#[command(name = "tutorboot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that runs TypeScript under Node.
#[derive(Args, Debug, Clone)]
pub struct LoaderArgs {
    /// Loader hook used to run TypeScript
    #[arg(long, value_enum, env = "TUTORBOOT_STRATEGY", default_value = "tsx")]
    pub strategy: LoaderHook,

    /// Project root (defaults to the nearest directory with a package.json)
    #[arg(long, env = "TUTORBOOT_PROJECT_ROOT")]
    pub project_root: Option<PathBuf>,

    /// Node executable (defaults to `node` on PATH)
    #[arg(long, env = "TUTORBOOT_NODE")]
    pub node: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the loader hook and hand control to the server entry point
    Serve {
        /// Entry point module, relative to the project root
        #[arg(long, env = "TUTORBOOT_ENTRY", default_value = "server/index.ts")]
        entry: PathBuf,

        #[command(flatten)]
        loader: LoaderArgs,
    },
    /// Show the resolved chat and healthcheck model ids
    Models {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ping the model provider with the healthcheck model
    Healthcheck {
        /// Provider base URL
        #[arg(long, env = crate::provider::BASE_URL_ENV, default_value = crate::provider::DEFAULT_BASE_URL)]
        base_url: String,

        /// Provider API key
        #[arg(long, env = crate::provider::API_KEY_ENV, hide_env_values = true)]
        api_key: Option<String>,

        /// Fail on the first error instead of retrying
        #[arg(long)]
        no_retry: bool,
    },
    /// Make sure the core learning content exists
    Seed {
        /// Seeding script, relative to the project root
        #[arg(long, env = "TUTORBOOT_SEED_SCRIPT", default_value = "scripts/seed-content.ts")]
        script: PathBuf,

        /// Fail unless every track has its expected quiz count
        #[arg(long)]
        enforce_counts: bool,

        #[command(flatten)]
        loader: LoaderArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_strategy() {
        let cli = Cli::try_parse_from([
            "tutorboot",
            "serve",
            "--entry",
            "src/server.ts",
            "--strategy",
            "ts-node",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve { entry, loader } => {
                assert_eq!(entry, PathBuf::from("src/server.ts"));
                assert_eq!(loader.strategy, LoaderHook::TsNodeRegister);
            }
            _ => panic!("Expected serve"),
        }
    }

    #[test]
    fn test_parse_seed_flags() {
        let cli = Cli::try_parse_from(["tutorboot", "-v", "seed", "--enforce-counts"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Seed { enforce_counts, .. } => assert!(enforce_counts),
            _ => panic!("Expected seed"),
        }
    }
}
