use std::path::PathBuf;

use thiserror::Error;

use super::strategy::LoaderHook;

/// The host runtime could not take the loader hook.
#[derive(Debug, Error)]
pub enum LoaderRegistrationError {
    #[error("Node runtime '{binary}' not found: {source}")]
    RuntimeNotFound {
        binary: String,
        #[source]
        source: which::Error,
    },

    #[error("loader hook package '{package}' is not installed (searched node_modules from {})", .root.display())]
    HookPackageMissing {
        package: &'static str,
        root: PathBuf,
    },

    #[error("loader hook '{0}' is already installed in this process")]
    AlreadyInstalled(LoaderHook),
}

/// The entry point could not be found, started, or failed while loading.
#[derive(Debug, Error)]
pub enum EntryPointLoadError {
    #[error("entry point not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("entry point requested before the loader hook was installed")]
    HookNotInstalled,

    #[error("failed to start entry point {}: {source}", .entry.display())]
    Spawn {
        entry: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for entry point: {0}")]
    Wait(#[source] std::io::Error),

    #[error("failed to listen for shutdown signals: {0}")]
    Signals(#[source] std::io::Error),
}

/// Any fatal startup condition.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("loader registration failed: {0}")]
    Registration(#[from] LoaderRegistrationError),

    #[error("entry point load failed: {0}")]
    EntryPoint(#[from] EntryPointLoadError),

    #[error("bootstrap already ran in this process")]
    AlreadyBootstrapped,
}

impl BootstrapError {
    /// Every startup failure exits with status 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EntryPointLoadError::NotFound(PathBuf::from("server/index.ts"));
        assert_eq!(err.to_string(), "entry point not found: server/index.ts");

        let err = BootstrapError::from(EntryPointLoadError::HookNotInstalled);
        assert_eq!(
            err.to_string(),
            "entry point load failed: entry point requested before the loader hook was installed"
        );

        let err = LoaderRegistrationError::AlreadyInstalled(LoaderHook::TsNodeRegister);
        assert!(err.to_string().contains("'ts-node'"));
    }

    #[test]
    fn test_startup_failures_exit_one() {
        assert_eq!(BootstrapError::AlreadyBootstrapped.exit_code(), 1);
        assert_eq!(
            BootstrapError::from(EntryPointLoadError::NotFound(PathBuf::from("x.ts"))).exit_code(),
            1
        );
    }
}
