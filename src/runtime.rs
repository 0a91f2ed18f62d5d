//! Process-lifetime state.
//!
//! The resolvers themselves are stateless. Commands that want a single view
//! of the configuration for the whole process go through
//! [`resolved_config`], which snapshots the environment once and caches the
//! result.
//!
//! The bootstrap guard enforces that the loader hook and entry point are
//! installed at most once per process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::config::{ConfigInputs, ResolvedConfig};

static RESOLVED: OnceLock<ResolvedConfig> = OnceLock::new();

static BOOTSTRAP_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Resolved model configuration for this process.
///
/// The first call reads the environment; later calls return the same value.
pub fn resolved_config() -> &'static ResolvedConfig {
    RESOLVED.get_or_init(|| ResolvedConfig::resolve(&ConfigInputs::from_env()))
}

/// Claim the right to bootstrap. Returns `false` if it was already claimed.
pub fn claim_bootstrap() -> bool {
    let already = BOOTSTRAP_CLAIMED.swap(true, Ordering::SeqCst);
    if already {
        tracing::warn!("Bootstrap was already claimed in this process");
    }
    !already
}
