//! Builder for invocations of the external updater executable.
//!
//! The argument grammar is fixed by the updater's parser:
//!
//! ```text
//! --check <version> --repository <repo> --product <name>
//! --read version|releasenotes --repository <repo> --product <name>
//! --install <dir> --repository <repo> --product <name> [--kill <pid>] [--start <path> --args <arg>...]
//! ```
//!
//! Outcomes are decided by stdout alone; the exit code is logged but never
//! interpreted.

use crate::core::{DeployError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Informational topics understood by `--read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTopic {
    Version,
    ReleaseNotes,
}

impl ReadTopic {
    pub const fn as_arg(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::ReleaseNotes => "releasenotes",
        }
    }
}

/// One invocation of the updater executable.
#[derive(Debug, Clone)]
pub struct UpdaterCommand {
    executable: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    timeout_duration: Option<Duration>,
}

impl UpdaterCommand {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            current_dir: None,
            timeout_duration: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    fn display_args(&self) -> String {
        self.args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
    }

    fn launch_failure(&self, error: &std::io::Error) -> DeployError {
        DeployError::ProcessLaunchFailure {
            path: self.executable.display().to_string(),
            reason: error.to_string(),
        }
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run to completion and return stdout.
    ///
    /// A process that cannot be started yields `ProcessLaunchFailure`; one that
    /// outlives the timeout yields `TransientProtocolError`. The process is left
    /// running when the timeout expires.
    pub async fn execute(self) -> Result<String> {
        let start = Instant::now();
        tracing::debug!(
            target: "protocol",
            "Executing command: {} {}",
            self.executable.display(),
            self.display_args()
        );

        let mut cmd = self.build();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| self.launch_failure(&e))?;
        let output_future = child.wait_with_output();

        let output = if let Some(duration) = self.timeout_duration {
            match timeout(duration, output_future).await {
                Ok(result) => result.map_err(|e| self.launch_failure(&e))?,
                Err(_) => {
                    tracing::warn!(
                        target: "protocol",
                        "Command timed out after {} seconds: {} {}",
                        duration.as_secs(),
                        self.executable.display(),
                        self.display_args()
                    );
                    return Err(DeployError::TransientProtocolError {
                        response: format!(
                            "updater did not answer within {} seconds",
                            duration.as_secs()
                        ),
                    });
                }
            }
        } else {
            output_future.await.map_err(|e| self.launch_failure(&e))?
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);

        tracing::debug!(
            target: "protocol",
            "Updater exited with {:?} after {}ms",
            output.status.code(),
            start.elapsed().as_millis()
        );
        if !stdout.is_empty() {
            tracing::debug!(target: "protocol", "{}", stdout.trim());
        }
        if !stderr.is_empty() {
            tracing::debug!(target: "protocol", "stderr: {}", stderr.trim());
        }

        Ok(stdout)
    }

    /// Launch without waiting.
    ///
    /// Used for the process handoff, where the launched updater is expected to
    /// terminate the caller. Nothing is observed after the spawn succeeds.
    pub fn spawn_detached(self) -> Result<()> {
        tracing::info!(
            target: "protocol",
            "Launching detached: {} {}",
            self.executable.display(),
            self.display_args()
        );

        let mut cmd = self.build();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| self.launch_failure(&e))?;
        tracing::debug!(target: "protocol", "Detached updater pid {:?}", child.id());
        Ok(())
    }
}

// Builders for the fixed argument grammar

impl UpdaterCommand {
    /// `--check <version> --repository <repo> --product <product>`
    pub fn check(executable: &Path, version: &str, repository: &str, product: &str) -> Self {
        Self::new(executable)
            .args(["--check", version])
            .args(["--repository", repository])
            .args(["--product", product])
    }

    /// `--read <topic> --repository <repo> --product <product>`
    pub fn read(executable: &Path, topic: ReadTopic, repository: &str, product: &str) -> Self {
        Self::new(executable)
            .args(["--read", topic.as_arg()])
            .args(["--repository", repository])
            .args(["--product", product])
    }

    /// `--install <target> --repository <repo> --product <product>`
    pub fn install(executable: &Path, target: &Path, repository: &str, product: &str) -> Self {
        Self::new(executable)
            .arg("--install")
            .arg(target.as_os_str())
            .args(["--repository", repository])
            .args(["--product", product])
    }

    /// Append `--kill <pid>`.
    pub fn kill(self, pid: u32) -> Self {
        self.arg("--kill").arg(pid.to_string())
    }

    /// Append `--start <path> --args <arg>...`; each argument stays a separate token.
    pub fn start<I, S>(self, executable: &Path, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.arg("--start").arg(executable.as_os_str()).arg("--args").args(args)
    }
}
