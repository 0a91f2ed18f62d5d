//! Loader hooks and the Node-based bootstrap strategy.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use clap::ValueEnum;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::{EntryPointLoadError, LoaderRegistrationError};
use super::supervise::{NodeEntry, SignalForwarder};

/// Default Node executable looked up on `PATH`.
const NODE_BINARY: &str = "node";

/// Source-transformation hook that lets Node load TypeScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoaderHook {
    /// `node --import tsx`
    #[value(name = "tsx")]
    TsxImport,
    /// `node --require ts-node/register`
    #[value(name = "ts-node")]
    TsNodeRegister,
}

impl LoaderHook {
    /// npm package that provides the hook.
    pub fn package(&self) -> &'static str {
        match self {
            LoaderHook::TsxImport => "tsx",
            LoaderHook::TsNodeRegister => "ts-node",
        }
    }

    /// Node flags that register the hook before the entry module is evaluated.
    pub fn node_args(&self) -> [&'static str; 2] {
        match self {
            LoaderHook::TsxImport => ["--import", "tsx"],
            LoaderHook::TsNodeRegister => ["--require", "ts-node/register"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderHook::TsxImport => "tsx",
            LoaderHook::TsNodeRegister => "ts-node",
        }
    }
}

impl fmt::Display for LoaderHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of the module to hand control to.
///
/// Relative paths are resolved against the strategy's project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointLocator {
    path: PathBuf,
}

impl EntryPointLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of the entry module under `root`.
    pub fn resolve_under(&self, root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        }
    }
}

impl fmt::Display for EntryPointLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// How the entry point finished after control was handed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryExit {
    /// Exit code, or `None` when terminated by a signal
    pub code: Option<i32>,
    /// Terminating signal, if any
    pub signal: Option<i32>,
}

impl EntryExit {
    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code the launcher passes on: the entry point's own code, or
    /// `128 + signal` when it was killed by a signal.
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

impl fmt::Display for EntryExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "status {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// Two-phase startup protocol: install a loader hook, then load the entry point.
///
/// Implementations are mutually exclusive alternatives; a process runs
/// exactly one of them, once.
pub trait BootstrapStrategy {
    type Entry: RunningEntry;

    /// Short name for logs.
    fn name(&self) -> &str;

    /// Register the loader hook with the host runtime.
    fn install_loader_hook(&mut self) -> Result<(), LoaderRegistrationError>;

    /// Start the entry point. Only valid after a successful install.
    ///
    /// Returning `Ok` is the handoff: the entry point is running.
    fn load_entry_point(&self, locator: &EntryPointLocator)
        -> Result<Self::Entry, EntryPointLoadError>;
}

/// An entry point that has been handed control.
#[allow(async_fn_in_trait)]
pub trait RunningEntry {
    fn id(&self) -> Option<u32>;

    /// Wait for the entry point to finish, relaying shutdown signals to it.
    async fn wait(self) -> Result<EntryExit, EntryPointLoadError>;
}

/// Hook state after a successful install.
#[derive(Debug, Clone)]
struct InstalledHook {
    node: PathBuf,
    package_dir: PathBuf,
}

/// Runs a TypeScript entry point under Node with a [`LoaderHook`] registered.
#[derive(Debug, Clone)]
pub struct NodeStrategy {
    hook: LoaderHook,
    project_root: PathBuf,
    node_binary: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
    installed: Option<InstalledHook>,
}

impl NodeStrategy {
    pub fn new(hook: LoaderHook, project_root: impl Into<PathBuf>) -> Self {
        Self {
            hook,
            project_root: project_root.into(),
            node_binary: None,
            env: Vec::new(),
            installed: None,
        }
    }

    /// Use a specific Node executable instead of looking one up on `PATH`.
    pub fn with_node_binary(mut self, node: Option<PathBuf>) -> Self {
        self.node_binary = node;
        self
    }

    /// Export an extra variable into the entry point's environment.
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    fn locate_node(&self) -> Result<PathBuf, LoaderRegistrationError> {
        let requested: OsString = self
            .node_binary
            .as_ref()
            .map(|p| p.clone().into_os_string())
            .unwrap_or_else(|| NODE_BINARY.into());

        which::which(&requested).map_err(|source| LoaderRegistrationError::RuntimeNotFound {
            binary: requested.to_string_lossy().into_owned(),
            source,
        })
    }

    /// Build the command that runs `locator` with the hook registered.
    ///
    /// Fails if the hook is not installed or the entry module does not exist.
    pub fn entry_command<I, S>(
        &self,
        locator: &EntryPointLocator,
        args: I,
    ) -> Result<Command, EntryPointLoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let installed = self
            .installed
            .as_ref()
            .ok_or(EntryPointLoadError::HookNotInstalled)?;

        let entry = locator.resolve_under(&self.project_root);
        if !entry.is_file() {
            return Err(EntryPointLoadError::NotFound(entry));
        }

        let mut command = Command::new(&installed.node);
        command
            .args(self.hook.node_args())
            .arg(&entry)
            .args(args)
            .current_dir(&self.project_root)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .kill_on_drop(true);

        Ok(command)
    }
}

/// Walk up from `start` looking for `node_modules/<package>/package.json`,
/// the same places Node's resolver would search.
pub fn find_package_dir(start: &Path, package: &str) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        let candidate = dir.join("node_modules").join(package);
        candidate
            .join("package.json")
            .is_file()
            .then_some(candidate)
    })
}

impl BootstrapStrategy for NodeStrategy {
    type Entry = NodeEntry;

    fn name(&self) -> &str {
        self.hook.as_str()
    }

    fn install_loader_hook(&mut self) -> Result<(), LoaderRegistrationError> {
        if self.installed.is_some() {
            return Err(LoaderRegistrationError::AlreadyInstalled(self.hook));
        }

        let node = self.locate_node()?;
        debug!("Using Node runtime at {}", node.display());

        let package_dir = find_package_dir(&self.project_root, self.hook.package()).ok_or_else(
            || LoaderRegistrationError::HookPackageMissing {
                package: self.hook.package(),
                root: self.project_root.clone(),
            },
        )?;
        debug!("Loader hook package found at {}", package_dir.display());

        self.installed = Some(InstalledHook { node, package_dir });
        Ok(())
    }

    fn load_entry_point(&self, locator: &EntryPointLocator) -> Result<NodeEntry, EntryPointLoadError> {
        let mut command = self.entry_command(locator, std::iter::empty::<&str>())?;
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Listen before spawning so a signal sent right after the handoff
        // is relayed rather than killing the launcher.
        let forwarder = SignalForwarder::install().map_err(EntryPointLoadError::Signals)?;

        let child = command.spawn().map_err(|source| EntryPointLoadError::Spawn {
            entry: locator.path().to_path_buf(),
            source,
        })?;

        if let Some(installed) = &self.installed {
            info!(
                "✅ Entry point started (pid {}, hook from {})",
                child.id().map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
                installed.package_dir.display()
            );
        }

        Ok(NodeEntry::new(child, forwarder))
    }
}
