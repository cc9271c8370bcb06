//! Test utilities for clientdeploy
//!
//! Helpers for tests that drive the orchestrator against a real subprocess:
//! - [`init_test_logging`] - tracing output for tests, installed once
//! - [`WarningRecorder`] - collects everything passed to the warning callback
//! - [`TestInstallation`] - temporary install root with a configuration store
//!   and a scripted fake updater
//!
//! # Fake updater
//!
//! The fake updater is a POSIX shell script installed at
//! `.clientdeploy/updater/<version>/clientdeploy-updater`. It appends every
//! invocation to a call log and answers from files in a private state folder:
//!
//! | Invocation | Answer |
//! |---|---|
//! | `--check ... --product P` | contents of `check-P` |
//! | `--read T ... --product P` | contents of `read-T-P` |
//! | `--install DIR ... --product P` | sources `install-P` with `$target` and `$self` set |
//!
//! ```rust,ignore
//! let install = TestInstallation::new()?;
//! install.write_config("1.0.0")?;
//! install.install_updater("1.0.0")?;
//! install.respond_check(TEST_PRODUCT, "#UPDATE available")?;
//! ```

use crate::config::Settings;
use crate::constants::{CONFIG_FILE_NAME, DEPLOY_DIR_NAME, UPDATER_DIR_NAME, UPDATER_PRODUCT_NAME};
use crate::core::DeployError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once, PoisonError};
use std::time::Duration;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Product name written into test configuration stores.
pub const TEST_PRODUCT: &str = "TestProduct";

/// Repository written into test configuration stores.
pub const TEST_REPOSITORY: &str = "https://deploy.example.test/repo";

/// Initialize logging for tests.
///
/// Respects `RUST_LOG` when set; otherwise uses `level`, or stays silent when
/// neither is given.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Collects warnings handed to an orchestrator.
#[derive(Clone, Default)]
pub struct WarningRecorder {
    warnings: Arc<Mutex<Vec<DeployError>>>,
}

impl WarningRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A warning callback feeding this recorder.
    pub fn callback(&self) -> impl Fn(&DeployError) + Send + Sync + 'static {
        let warnings = Arc::clone(&self.warnings);
        move |warning: &DeployError| {
            warnings.lock().unwrap_or_else(PoisonError::into_inner).push(warning.clone());
        }
    }

    /// All warnings recorded so far.
    pub fn all(&self) -> Vec<DeployError> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Remove and return all warnings recorded so far.
    pub fn take(&self) -> Vec<DeployError> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A throwaway installation root.
pub struct TestInstallation {
    _temp: TempDir,
    root: PathBuf,
    state_dir: PathBuf,
}

impl TestInstallation {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create temp dir")?;
        let root = temp.path().join("app");
        let state_dir = temp.path().join("fake-updater");
        std::fs::create_dir_all(&root)?;
        std::fs::create_dir_all(&state_dir)?;
        Ok(Self {
            _temp: temp,
            root,
            state_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join(DEPLOY_DIR_NAME).join(UPDATER_DIR_NAME)
    }

    /// Settings with timeouts short enough for tests.
    pub fn settings(&self) -> Settings {
        Settings {
            check_interval_secs: 1,
            protocol_timeout_secs: 10,
            self_update_timeout_secs: 2,
            ..Settings::default()
        }
    }

    /// Write a complete configuration store for [`TEST_PRODUCT`] at `version`.
    pub fn write_config(&self, version: &str) -> Result<()> {
        self.write_config_raw(&format!(
            "# test installation\nuuid|00000000-0000-4000-8000-000000000000\nrepo|{TEST_REPOSITORY}\nproduct|{TEST_PRODUCT}\nversion|{version}\n"
        ))
    }

    pub fn write_config_raw(&self, content: &str) -> Result<()> {
        std::fs::write(self.root.join(CONFIG_FILE_NAME), content)
            .context("Failed to write configuration store")
    }

    /// Install the fake updater as build `version`; returns the executable path.
    #[cfg(unix)]
    pub fn install_updater(&self, version: &str) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.versions_dir().join(version);
        std::fs::create_dir_all(&dir)?;
        let executable = dir.join(Settings::default().updater_file_name());
        let template = self.state_dir.join("updater.sh");
        std::fs::write(&template, self.script())?;
        // A child process writes the executable so no write descriptor to it
        // is ever open here; a fork from a parallel test would inherit one and
        // the exec would fail with ETXTBSY.
        let status = std::process::Command::new("cp")
            .arg(&template)
            .arg(&executable)
            .status()
            .context("Failed to run cp")?;
        anyhow::ensure!(status.success(), "cp exited with {status}");
        std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755))?;
        Ok(executable)
    }

    /// A connectable installation: configuration for `product_version` and
    /// updater build `updater_version`, which reports itself as current.
    #[cfg(unix)]
    pub fn install_current(&self, product_version: &str, updater_version: &str) -> Result<PathBuf> {
        self.write_config(product_version)?;
        self.respond_check(UPDATER_PRODUCT_NAME, "#LATEST")?;
        self.install_updater(updater_version)
    }

    fn script(&self) -> String {
        format!(
            r#"#!/bin/sh
state='{state}'
printf '%s\n' "$*" >> "$state/calls.log"
mode="$1"
value="$2"
product=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--product" ]; then product="$arg"; fi
  prev="$arg"
done
case "$mode" in
  --check)
    printf 'begin\n' >> "$state/activity.log"
    if [ -f "$state/delay-check" ]; then sleep "$(cat "$state/delay-check")"; fi
    cat "$state/check-$product" 2>/dev/null
    printf 'end\n' >> "$state/activity.log"
    ;;
  --read)
    cat "$state/read-$value-$product" 2>/dev/null
    ;;
  --install)
    target="$value"
    self="$0"
    if [ -f "$state/install-$product" ]; then . "$state/install-$product"; fi
    ;;
esac
"#,
            state = self.state_dir.display()
        )
    }

    /// Answer `--check` for `product` with `response`.
    pub fn respond_check(&self, product: &str, response: &str) -> Result<()> {
        std::fs::write(self.state_dir.join(format!("check-{product}")), response)
            .context("Failed to write check response")
    }

    /// Answer `--read <topic>` (`version` or `releasenotes`) for `product`.
    pub fn respond_read(&self, topic: &str, product: &str, response: &str) -> Result<()> {
        std::fs::write(self.state_dir.join(format!("read-{topic}-{product}")), response)
            .context("Failed to write read response")
    }

    /// Run `script` (sourced, with `$target`, `$self`, `$state` set) on `--install` of `product`.
    pub fn on_install(&self, product: &str, script: &str) -> Result<()> {
        std::fs::write(self.state_dir.join(format!("install-{product}")), script)
            .context("Failed to write install hook")
    }

    /// Make `--check` take `delay` before answering.
    pub fn delay_checks(&self, delay: Duration) -> Result<()> {
        std::fs::write(self.state_dir.join("delay-check"), format!("{:.3}", delay.as_secs_f64()))
            .context("Failed to write check delay")
    }

    /// Publish updater build `version`: the updater reports an update for
    /// itself, and installing it copies the fake updater into the new folder
    /// and stops reporting the update.
    pub fn publish_updater(&self, version: &str) -> Result<()> {
        self.publish_updater_with(version, "", "")
    }

    /// Like [`publish_updater`](Self::publish_updater), with shell snippets run
    /// before and after the new build is written.
    pub fn publish_updater_with(&self, version: &str, before: &str, after: &str) -> Result<()> {
        self.respond_check(UPDATER_PRODUCT_NAME, "#UPDATE")?;
        self.respond_read("version", UPDATER_PRODUCT_NAME, &format!("{version}\n"))?;
        self.on_install(
            UPDATER_PRODUCT_NAME,
            &format!(
                "{before}\nmkdir -p \"$target\"\ncp \"$self\" \"$target/{exe}\"\nchmod 755 \"$target/{exe}\"\nprintf '#LATEST' > \"$state/check-{product}\"\n{after}\n",
                exe = Settings::default().updater_file_name(),
                product = UPDATER_PRODUCT_NAME
            ),
        )
    }

    /// Every invocation of the fake updater so far, one line each.
    pub fn calls(&self) -> Vec<String> {
        read_lines(&self.state_dir.join("calls.log"))
    }

    /// Invocations whose first argument is `mode` (e.g. `--install`).
    pub fn calls_with(&self, mode: &str) -> Vec<String> {
        self.calls().into_iter().filter(|line| line.starts_with(mode)).collect()
    }

    /// `begin`/`end` markers written around every `--check`.
    pub fn check_activity(&self) -> Vec<String> {
        read_lines(&self.state_dir.join("activity.log"))
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
