//! Startup sequencing for the tutor service.
//!
//! ```text
//! install_loader_hook()   // register the TypeScript hook with Node
//! load_entry_point()      // hand control to server/index.ts
//! wait()                  // supervise until the service exits
//! ```
//!
//! The first two phases are fatal on failure. A broken hook or missing entry
//! point is a deployment defect, so nothing is retried and no partial state
//! is kept. Those failures are logged with [`STARTUP_FAILURE_MARKER`]. Once
//! the entry point is running, its exit belongs to the service: a non-zero
//! exit is logged with [`RUNTIME_EXIT_MARKER`] instead.

use std::fmt;

use tracing::{error, info};

use super::error::BootstrapError;
use super::strategy::{BootstrapStrategy, EntryExit, EntryPointLocator, RunningEntry};

/// Prefix on every fatal startup log line.
pub const STARTUP_FAILURE_MARKER: &str = "[startup-failure]";

/// Prefix on the log line for an entry point that exited non-zero after starting.
pub const RUNTIME_EXIT_MARKER: &str = "[runtime-exit]";

/// Progress of one bootstrap phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PhaseStatus {
    #[default]
    NotStarted,
    Success,
    Failed(String),
}

impl PhaseStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PhaseStatus::Success)
    }
}

/// Result of a bootstrap run, consumed by the process supervisor as an exit code.
#[derive(Debug)]
pub enum BootstrapOutcome {
    /// Control was handed to the entry point; it has since exited as recorded.
    Started(EntryExit),
    /// Startup failed; the process must terminate.
    Failed(BootstrapError),
}

impl BootstrapOutcome {
    /// Startup failures exit 1; otherwise the entry point's own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapOutcome::Started(exit) => exit.exit_code(),
            BootstrapOutcome::Failed(err) => err.exit_code(),
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, BootstrapOutcome::Started(_))
    }
}

/// Phase-by-phase record of a bootstrap run.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub hook: PhaseStatus,
    pub entry_point: PhaseStatus,
}

/// Log any fatal startup condition with the grep-able marker.
pub fn report_startup_error(err: impl fmt::Display) {
    error!("{} {}", STARTUP_FAILURE_MARKER, err);
}

/// Log a fatal startup error with the grep-able marker.
pub fn report_failure(err: &BootstrapError) {
    report_startup_error(err);
}

/// Install the loader hook, load the entry point, and supervise it.
///
/// The entry point is never touched if hook registration fails.
pub async fn bootstrap<S>(strategy: &mut S, locator: &EntryPointLocator) -> BootstrapOutcome
where
    S: BootstrapStrategy,
{
    bootstrap_with_report(strategy, locator).await.0
}

/// Same as [`bootstrap`], also returning the per-phase status.
pub async fn bootstrap_with_report<S>(
    strategy: &mut S,
    locator: &EntryPointLocator,
) -> (BootstrapOutcome, BootstrapReport)
where
    S: BootstrapStrategy,
{
    let mut report = BootstrapReport::default();

    info!("🔌 Installing {} loader hook...", strategy.name());
    if let Err(e) = strategy.install_loader_hook() {
        let err = BootstrapError::from(e);
        report.hook = PhaseStatus::Failed(err.to_string());
        report_failure(&err);
        return (BootstrapOutcome::Failed(err), report);
    }
    info!("✅ Loader hook installed");
    report.hook = PhaseStatus::Success;

    info!("🚀 Loading entry point {}...", locator);
    let entry = match strategy.load_entry_point(locator) {
        Ok(entry) => entry,
        Err(e) => {
            let err = BootstrapError::from(e);
            report.entry_point = PhaseStatus::Failed(err.to_string());
            report_failure(&err);
            return (BootstrapOutcome::Failed(err), report);
        }
    };
    report.entry_point = PhaseStatus::Success;

    match entry.wait().await {
        Ok(exit) if exit.success() => {
            info!("Entry point exited cleanly");
            (BootstrapOutcome::Started(exit), report)
        }
        Ok(exit) => {
            error!("{} entry point exited with {}", RUNTIME_EXIT_MARKER, exit);
            (BootstrapOutcome::Started(exit), report)
        }
        Err(e) => {
            let err = BootstrapError::from(e);
            report_failure(&err);
            (BootstrapOutcome::Failed(err), report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup::error::{EntryPointLoadError, LoaderRegistrationError};
    use crate::startup::strategy::LoaderHook;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Finishes with a preset exit, or a wait error when there is none.
    struct FakeEntry(Option<EntryExit>);

    impl RunningEntry for FakeEntry {
        fn id(&self) -> Option<u32> {
            Some(42)
        }

        async fn wait(self) -> Result<EntryExit, EntryPointLoadError> {
            self.0.ok_or_else(|| {
                EntryPointLoadError::Wait(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "child vanished",
                ))
            })
        }
    }

    /// Records the calls it receives and fails where told to.
    #[derive(Default)]
    struct FakeStrategy {
        fail_install: bool,
        known_entry: Option<PathBuf>,
        exit: Option<EntryExit>,
        calls: RefCell<Vec<String>>,
    }

    impl BootstrapStrategy for FakeStrategy {
        type Entry = FakeEntry;

        fn name(&self) -> &str {
            "fake"
        }

        fn install_loader_hook(&mut self) -> Result<(), LoaderRegistrationError> {
            self.calls.borrow_mut().push("install".to_string());
            if self.fail_install {
                return Err(LoaderRegistrationError::AlreadyInstalled(LoaderHook::TsxImport));
            }
            Ok(())
        }

        fn load_entry_point(
            &self,
            locator: &EntryPointLocator,
        ) -> Result<FakeEntry, EntryPointLoadError> {
            self.calls
                .borrow_mut()
                .push(format!("load {}", locator.path().display()));
            match &self.known_entry {
                Some(known) if known == locator.path() => Ok(FakeEntry(self.exit)),
                _ => Err(EntryPointLoadError::NotFound(locator.path().to_path_buf())),
            }
        }
    }

    fn exited(code: i32) -> Option<EntryExit> {
        Some(EntryExit {
            code: Some(code),
            signal: None,
        })
    }

    #[tokio::test]
    async fn test_install_then_load() {
        let mut strategy = FakeStrategy {
            known_entry: Some(PathBuf::from("server/index.ts")),
            exit: exited(0),
            ..Default::default()
        };
        let (outcome, report) =
            bootstrap_with_report(&mut strategy, &EntryPointLocator::new("server/index.ts")).await;

        assert!(outcome.is_started());
        assert_eq!(outcome.exit_code(), 0);
        assert!(report.hook.is_success());
        assert!(report.entry_point.is_success());
        assert_eq!(
            *strategy.calls.borrow(),
            vec!["install".to_string(), "load server/index.ts".to_string()]
        );
    }

    #[tokio::test]
    async fn test_crash_after_handoff_is_not_a_startup_failure() {
        let mut strategy = FakeStrategy {
            known_entry: Some(PathBuf::from("server/index.ts")),
            exit: exited(3),
            ..Default::default()
        };
        let (outcome, report) =
            bootstrap_with_report(&mut strategy, &EntryPointLocator::new("server/index.ts")).await;

        match &outcome {
            BootstrapOutcome::Started(exit) => assert_eq!(exit.code, Some(3)),
            other => panic!("Expected Started, got {:?}", other),
        }
        assert_eq!(outcome.exit_code(), 3);
        assert!(report.entry_point.is_success());
    }

    #[tokio::test]
    async fn test_wait_failure_is_fatal() {
        let mut strategy = FakeStrategy {
            known_entry: Some(PathBuf::from("server/index.ts")),
            exit: None,
            ..Default::default()
        };
        let outcome = bootstrap(&mut strategy, &EntryPointLocator::new("server/index.ts")).await;

        assert!(matches!(
            outcome,
            BootstrapOutcome::Failed(BootstrapError::EntryPoint(EntryPointLoadError::Wait(_)))
        ));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_registration_failure_skips_load() {
        let mut strategy = FakeStrategy {
            fail_install: true,
            known_entry: Some(PathBuf::from("server/index.ts")),
            exit: exited(0),
            ..Default::default()
        };
        let (outcome, report) =
            bootstrap_with_report(&mut strategy, &EntryPointLocator::new("server/index.ts")).await;

        match &outcome {
            BootstrapOutcome::Failed(BootstrapError::Registration(_)) => {}
            other => panic!("Expected registration failure, got {:?}", other),
        }
        assert_eq!(outcome.exit_code(), 1);
        assert!(matches!(report.hook, PhaseStatus::Failed(_)));
        assert_eq!(report.entry_point, PhaseStatus::NotStarted);
        assert_eq!(*strategy.calls.borrow(), vec!["install".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_entry_point_is_fatal() {
        let mut strategy = FakeStrategy::default();
        let outcome = bootstrap(&mut strategy, &EntryPointLocator::new("nope.ts")).await;

        match &outcome {
            BootstrapOutcome::Failed(BootstrapError::EntryPoint(EntryPointLoadError::NotFound(
                path,
            ))) => assert_eq!(path, &PathBuf::from("nope.ts")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert_eq!(outcome.exit_code(), 1);
    }
}
