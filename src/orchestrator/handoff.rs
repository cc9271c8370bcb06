//! Handing the process over to the updater.
//!
//! The updater is launched with `--kill <pid>` and `--start <exe> --args ...`:
//! it terminates this process, installs the new build and relaunches the
//! program with its original arguments. The launch is fire-and-forget and
//! races with our own teardown, so nothing is awaited after the spawn.

use super::Orchestrator;
use super::state::UpdaterBinaryHandle;
use crate::config::InstallationDescriptor;
use crate::constants::HANDOFF_NOTICE;
use crate::protocol::UpdaterCommand;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How the current process was started, so it can be started again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub pid: u32,
    pub executable: PathBuf,
    pub args: Vec<OsString>,
}

impl ProcessInvocation {
    /// Capture the running process: its id, executable and arguments (without argv[0]).
    pub fn current() -> std::io::Result<Self> {
        Ok(Self {
            pid: std::process::id(),
            executable: std::env::current_exe()?,
            args: std::env::args_os().skip(1).collect(),
        })
    }
}

/// `--install <root> ... --kill <pid> --start <exe> --args <arg>...`
pub(crate) fn handoff_command(
    install_root: &Path,
    descriptor: &InstallationDescriptor,
    handle: &UpdaterBinaryHandle,
    invocation: &ProcessInvocation,
) -> UpdaterCommand {
    UpdaterCommand::install(
        &handle.executable_path,
        install_root,
        &descriptor.repository,
        &descriptor.product,
    )
    .kill(invocation.pid)
    .start(&invocation.executable, invocation.args.iter().cloned())
}

impl Orchestrator {
    /// Launch the updater to replace and restart this process.
    ///
    /// `notify` is called once with "Beginning update..." right before the
    /// launch. When not ready nothing is launched and `notify` is not called.
    /// Returns whether the updater was launched.
    pub async fn update_now<F>(&self, invocation: &ProcessInvocation, notify: F) -> bool
    where
        F: FnOnce(&str),
    {
        let command = {
            let state = self.inner.state.lock().await;
            let Some((descriptor, handle)) = state.ready_parts() else {
                warn!(
                    target: "orchestrator",
                    "Update requested while {}; ignoring",
                    state.readiness
                );
                return false;
            };
            handoff_command(&self.inner.install_root, descriptor, handle, invocation)
        };

        notify(HANDOFF_NOTICE);
        info!(target: "orchestrator", "Handing over pid {} to the updater", invocation.pid);

        match command.spawn_detached() {
            Ok(()) => true,
            Err(e) => {
                self.inner.report(&e);
                false
            }
        }
    }
}
