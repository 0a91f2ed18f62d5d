//! Content seeding.
//!
//! `ensureCoreLearningContent` lives in the TypeScript service. It is run
//! here as a script under the same loader hook as the server, and reports
//! what it restored as a single JSON line on stdout:
//!
//! ```json
//! {"restoredTracks":["algebra-1","geometry"],"quizCount":42}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::startup::{
    BootstrapStrategy, EntryPointLoadError, EntryPointLocator, LoaderRegistrationError,
    NodeStrategy,
};

/// Lines of script stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOptions {
    /// Fail unless the expected number of quizzes per track exists
    pub enforce_counts: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    #[serde(default)]
    pub restored_tracks: Vec<String>,
    #[serde(default)]
    pub quiz_count: u32,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("loader hook unavailable: {0}")]
    Registration(#[from] LoaderRegistrationError),

    #[error(transparent)]
    Script(#[from] EntryPointLoadError),

    #[error("failed to run seeding script: {0}")]
    Io(#[from] std::io::Error),

    #[error("seeding script exited with status {code:?}: {stderr}")]
    Rejected { code: Option<i32>, stderr: String },

    #[error("seeding script produced no report")]
    MissingReport,
}

/// Collaborator that makes sure the core learning content exists.
#[allow(async_fn_in_trait)]
pub trait ContentSeeder {
    async fn ensure_core_learning_content(
        &self,
        options: SeedOptions,
    ) -> Result<SeedReport, SeedError>;
}

/// Runs a TypeScript seeding script through a [`NodeStrategy`].
pub struct ScriptSeeder {
    strategy: NodeStrategy,
    script: EntryPointLocator,
}

impl ScriptSeeder {
    /// Install the strategy's loader hook and bind it to `script`.
    pub fn new(mut strategy: NodeStrategy, script: EntryPointLocator) -> Result<Self, SeedError> {
        if !strategy.is_installed() {
            strategy.install_loader_hook()?;
        }
        Ok(Self { strategy, script })
    }
}

impl ContentSeeder for ScriptSeeder {
    async fn ensure_core_learning_content(
        &self,
        options: SeedOptions,
    ) -> Result<SeedReport, SeedError> {
        let args: &[&str] = if options.enforce_counts {
            &["--enforce-counts"]
        } else {
            &[]
        };

        info!("🌱 Running seeding script {}...", self.script);
        let output = self.strategy.entry_command(&self.script, args)?.output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("Seeding script stdout:\n{}", stdout);

        if !output.status.success() {
            return Err(SeedError::Rejected {
                code: output.status.code(),
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        parse_report(&stdout)
    }
}

/// Take the last line of `stdout` that parses as a [`SeedReport`].
pub fn parse_report(stdout: &str) -> Result<SeedReport, SeedError> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str::<SeedReport>(line).ok())
        .ok_or(SeedError::MissingReport)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// One-line summary printed after a successful run.
pub fn summarize(report: &SeedReport) -> String {
    let tracks = if report.restored_tracks.is_empty() {
        "none".to_string()
    } else {
        report.restored_tracks.join(", ")
    };
    format!(
        "Restored tracks: {} | Quizzes available: {}",
        tracks, report.quiz_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSeeder(Option<SeedReport>);

    impl ContentSeeder for FixedSeeder {
        async fn ensure_core_learning_content(
            &self,
            options: SeedOptions,
        ) -> Result<SeedReport, SeedError> {
            match &self.0 {
                Some(report) if options.enforce_counts && report.quiz_count == 0 => {
                    Err(SeedError::Rejected {
                        code: Some(1),
                        stderr: "quiz count below minimum".to_string(),
                    })
                }
                Some(report) => Ok(report.clone()),
                None => Err(SeedError::MissingReport),
            }
        }
    }

    #[test]
    fn test_parse_report_takes_last_json_line() {
        let stdout = "connecting to db\n{\"restoredTracks\":[\"old\"],\"quizCount\":1}\n\
                      done\n  {\"restoredTracks\":[\"algebra\",\"geometry\"],\"quizCount\":12}  \n";
        let report = parse_report(stdout).unwrap();
        assert_eq!(report.restored_tracks, vec!["algebra", "geometry"]);
        assert_eq!(report.quiz_count, 12);
    }

    #[test]
    fn test_parse_report_skips_garbage() {
        let stdout = "{\"quizCount\":3}\n{not json\n";
        let report = parse_report(stdout).unwrap();
        assert!(report.restored_tracks.is_empty());
        assert_eq!(report.quiz_count, 3);

        assert!(matches!(
            parse_report("no report here\n"),
            Err(SeedError::MissingReport)
        ));
    }

    #[test]
    fn test_stderr_tail() {
        let stderr = (1..=8).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        assert_eq!(stderr_tail(&stderr), "line 4\nline 5\nline 6\nline 7\nline 8");
    }

    #[test]
    fn test_summarize() {
        let report = SeedReport {
            restored_tracks: vec!["algebra".to_string()],
            quiz_count: 5,
        };
        assert_eq!(
            summarize(&report),
            "Restored tracks: algebra | Quizzes available: 5"
        );
        assert_eq!(
            summarize(&SeedReport::default()),
            "Restored tracks: none | Quizzes available: 0"
        );
    }

    #[tokio::test]
    async fn test_seeder_trait_contract() {
        let seeder = FixedSeeder(Some(SeedReport::default()));
        assert!(seeder
            .ensure_core_learning_content(SeedOptions::default())
            .await
            .is_ok());
        assert!(seeder
            .ensure_core_learning_content(SeedOptions {
                enforce_counts: true
            })
            .await
            .is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_seeder_passes_enforce_flag() {
        use crate::startup::LoaderHook;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("node_modules").join("tsx");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), "{}").unwrap();
        fs::write(temp.path().join("seed.ts"), "").unwrap();

        let fake_node = temp.path().join("fake-node");
        fs::write(
            &fake_node,
            "#!/bin/sh\necho 'seeding...'\ncase \"$*\" in\n  *--enforce-counts*) echo '{\"restoredTracks\":[\"algebra\"],\"quizCount\":9}' ;;\n  *) echo '{\"restoredTracks\":[],\"quizCount\":0}' ;;\nesac\n",
        )
        .unwrap();
        fs::set_permissions(&fake_node, fs::Permissions::from_mode(0o755)).unwrap();

        let strategy =
            NodeStrategy::new(LoaderHook::TsxImport, temp.path()).with_node_binary(Some(fake_node));
        let seeder = ScriptSeeder::new(strategy, EntryPointLocator::new("seed.ts")).unwrap();

        let report = seeder
            .ensure_core_learning_content(SeedOptions {
                enforce_counts: true,
            })
            .await
            .unwrap();
        assert_eq!(report.restored_tracks, vec!["algebra"]);
        assert_eq!(report.quiz_count, 9);

        let report = seeder
            .ensure_core_learning_content(SeedOptions::default())
            .await
            .unwrap();
        assert_eq!(report.quiz_count, 0);
    }
}
