//! Supervision of a running entry point.
//!
//! The launcher stays in front of Node as the process a service manager
//! talks to. Shutdown signals it receives are relayed to the entry point and
//! the launcher then waits for it, so the entry point never outlives the
//! launcher and the launcher's exit code reflects the service.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;
use tracing::{info, warn};

use super::error::EntryPointLoadError;
use super::strategy::{EntryExit, RunningEntry};

/// Shutdown signals the launcher relays.
#[cfg(unix)]
#[derive(Debug)]
pub struct SignalForwarder {
    terminate: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalForwarder {
    /// Start listening. Must run inside the tokio runtime.
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the child, relaying every signal received meanwhile.
    async fn wait(&mut self, child: &mut Child) -> io::Result<ExitStatus> {
        use nix::sys::signal::Signal;

        loop {
            let signal = tokio::select! {
                status = child.wait() => return status,
                _ = self.terminate.recv() => Signal::SIGTERM,
                _ = self.interrupt.recv() => Signal::SIGINT,
                _ = self.hangup.recv() => Signal::SIGHUP,
            };
            relay(child, signal);
        }
    }
}

#[cfg(unix)]
fn relay(child: &Child, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    info!("Forwarding {} to entry point (pid {})", signal, pid);
    if let Err(e) = kill(Pid::from_raw(pid as i32), signal) {
        warn!("Failed to forward {} to entry point: {}", signal, e);
    }
}

#[cfg(not(unix))]
#[derive(Debug)]
pub struct SignalForwarder;

#[cfg(not(unix))]
impl SignalForwarder {
    pub fn install() -> io::Result<Self> {
        Ok(Self)
    }

    async fn wait(&mut self, child: &mut Child) -> io::Result<ExitStatus> {
        tokio::select! {
            status = child.wait() => return status,
            _ = tokio::signal::ctrl_c() => {}
        }
        info!("Stopping entry point");
        child.start_kill()?;
        child.wait().await
    }
}

/// Entry point running as a Node child process.
#[derive(Debug)]
pub struct NodeEntry {
    child: Child,
    forwarder: SignalForwarder,
}

impl NodeEntry {
    pub(super) fn new(child: Child, forwarder: SignalForwarder) -> Self {
        Self { child, forwarder }
    }
}

impl RunningEntry for NodeEntry {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(mut self) -> Result<EntryExit, EntryPointLoadError> {
        let status = self
            .forwarder
            .wait(&mut self.child)
            .await
            .map_err(EntryPointLoadError::Wait)?;
        Ok(EntryExit::from_status(status))
    }
}
