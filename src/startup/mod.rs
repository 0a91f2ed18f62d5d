//! Bootstrap loader.
//!
//! Runs the service's TypeScript entry point under Node:
//! - install a loader hook (`tsx` or `ts-node`) so Node can read TypeScript
//! - load the entry point exactly once, then supervise it until it exits
//!
//! Every failure is fatal: the process exits non-zero instead of running
//! half-initialized.

mod bootstrap;
mod error;
mod strategy;
mod supervise;

pub use bootstrap::{
    bootstrap, bootstrap_with_report, report_failure, report_startup_error, BootstrapOutcome,
    BootstrapReport, PhaseStatus, RUNTIME_EXIT_MARKER, STARTUP_FAILURE_MARKER,
};
pub use error::{BootstrapError, EntryPointLoadError, LoaderRegistrationError};
pub use strategy::{
    find_package_dir, BootstrapStrategy, EntryExit, EntryPointLocator, LoaderHook, NodeStrategy,
    RunningEntry,
};
pub use supervise::NodeEntry;
