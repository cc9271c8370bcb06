use crate::constants::{
    DEFAULT_CHECK_INTERVAL, PROTOCOL_CALL_TIMEOUT, SELF_UPDATE_INSTALL_TIMEOUT,
    UPDATER_EXECUTABLE_NAME, UPDATER_PRODUCT_NAME,
};
use crate::core::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for the update orchestrator.
///
/// Every field has a default, so an empty TOML file (or none at all) yields the
/// stock behavior:
///
/// ```toml
/// check_interval_secs = 3600
/// protocol_timeout_secs = 120
/// self_update_timeout_secs = 45
/// updater_product = "clientdeploy"
/// updater_executable = "clientdeploy-updater"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Seconds between periodic update checks.
    pub check_interval_secs: u64,

    /// Upper bound for a single `--check` or `--read` call.
    ///
    /// An unresponsive updater would otherwise stall a tick forever; expiry is
    /// reported as a transient error.
    pub protocol_timeout_secs: u64,

    /// Upper bound for the blocking wait on an updater self-install.
    pub self_update_timeout_secs: u64,

    /// Product name the repository reserves for the updater itself.
    pub updater_product: String,

    /// Base file name of the updater executable inside a version folder.
    ///
    /// `.exe` is appended on Windows.
    pub updater_executable: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL.as_secs(),
            protocol_timeout_secs: PROTOCOL_CALL_TIMEOUT.as_secs(),
            self_update_timeout_secs: SELF_UPDATE_INSTALL_TIMEOUT.as_secs(),
            updater_product: UPDATER_PRODUCT_NAME.to_string(),
            updater_executable: UPDATER_EXECUTABLE_NAME.to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DeployError::io("reading settings", path, &e))?;

        toml::from_str(&content).map_err(|e| DeployError::SettingsParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Load settings from `path` when given, otherwise use the defaults.
    pub async fn load_with_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => Ok(Self::default()),
        }
    }

    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub const fn protocol_timeout(&self) -> Duration {
        Duration::from_secs(self.protocol_timeout_secs)
    }

    pub const fn self_update_timeout(&self) -> Duration {
        Duration::from_secs(self.self_update_timeout_secs)
    }

    /// Platform file name of the updater executable.
    pub fn updater_file_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.updater_executable)
        } else {
            self.updater_executable.clone()
        }
    }
}
