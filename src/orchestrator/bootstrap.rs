//! The updater updating its own binary before it is trusted with the product.
//!
//! The updater is asked about the reserved updater product. When a newer build
//! exists it is installed into its own version folder next to the current one,
//! the orchestrator waits (bounded) for the executable to appear, swaps the
//! handle and removes the previous build. The handle never points at a folder
//! whose executable has not been seen on disk.

use super::Inner;
use super::state::{State, UpdaterBinaryHandle};
use crate::core::{DeployError, NotReadyReason, Readiness};
use crate::protocol::ReadTopic;
use std::path::Path;
use tracing::{debug, info};

impl Inner {
    /// Self-update step, run by connect and by every tick while ready.
    pub(super) async fn self_update(&self, state: &mut State) {
        let Some((descriptor, handle)) = state.ready_parts() else {
            return;
        };
        let repository = descriptor.repository.clone();
        let handle = handle.clone();
        let product = self.settings.updater_product.clone();
        let client = self.client_for(&handle);

        let available = client
            .check(&handle.installed_version, &repository, &product)
            .await
            .and_then(|response| response.into_update_available());
        match available {
            Ok(false) => {
                debug!(target: "orchestrator", "Updater {} is current", handle.installed_version);
                return;
            }
            Ok(true) => {}
            Err(e) => {
                self.absorb(state, e);
                return;
            }
        }

        state.readiness = Readiness::NotReady(NotReadyReason::SelfUpdating);

        let new_version = match client.read(ReadTopic::Version, &repository, &product).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                state.readiness = Readiness::Ready;
                self.absorb(state, e);
                return;
            }
        };

        if let Err(reason) = validate_new_version(&new_version, &handle.installed_version) {
            self.fail_self_update(state, &new_version, reason);
            return;
        }

        info!(
            target: "orchestrator",
            "Updating updater {} -> {}",
            handle.installed_version,
            new_version
        );
        let target = self.versions_dir().join(&new_version);
        let wait = self.settings.self_update_timeout();
        let install_note = match client.install_and_wait(&target, &repository, &product, wait).await
        {
            Ok(()) => None,
            Err(DeployError::TransientProtocolError { .. }) => Some(format!(
                "install did not finish within {} seconds",
                wait.as_secs()
            )),
            Err(e) => Some(e.to_string()),
        };

        let executable_path = target.join(self.settings.updater_file_name());
        let installed = tokio::fs::try_exists(&executable_path).await.unwrap_or(false);
        let current_dir = handle.build_dir().map(Path::to_path_buf);

        if self.is_closed() {
            info!(
                target: "orchestrator",
                "Discarding updater {} install result after shutdown",
                new_version
            );
            if !installed {
                self.remove_incomplete_build(&target, current_dir.as_deref()).await;
            }
            state.readiness = Readiness::NotReady(NotReadyReason::ShutDown);
            return;
        }

        if !installed {
            let mut reason = format!("executable not found at '{}'", executable_path.display());
            if let Some(note) = install_note {
                reason = format!("{reason} ({note})");
            }
            self.remove_incomplete_build(&target, current_dir.as_deref()).await;
            self.fail_self_update(state, &new_version, reason);
            return;
        }

        let previous = state.handle.replace(UpdaterBinaryHandle {
            installed_version: new_version,
            executable_path,
        });
        state.readiness = Readiness::Ready;
        info!(target: "orchestrator", "Updater replaced by {}", target.display());

        if let Some(previous) = previous {
            self.remove_previous_build(&previous, &target).await;
        }
    }

    fn fail_self_update(&self, state: &mut State, version: &str, reason: String) {
        state.readiness = Readiness::NotReady(NotReadyReason::SelfUpdateFailed);
        self.report(&DeployError::SelfUpdateInstallFailure {
            version: version.to_string(),
            reason,
        });
    }

    /// Remove a build folder the updater created without an executable, so the
    /// next connect does not select it as the newest build.
    async fn remove_incomplete_build(&self, target: &Path, current_dir: Option<&Path>) {
        if current_dir == Some(target) || target.parent() != Some(self.versions_dir().as_path()) {
            return;
        }

        match tokio::fs::remove_dir_all(target).await {
            Ok(()) => debug!(target: "orchestrator", "Removed incomplete build {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => self.report(&DeployError::StaleUpdaterCleanup {
                path: target.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Best-effort removal of the replaced build; failures only warn.
    async fn remove_previous_build(&self, previous: &UpdaterBinaryHandle, current_dir: &Path) {
        let Some(old_dir) = previous.build_dir() else {
            return;
        };
        if old_dir == current_dir || old_dir.parent() != Some(self.versions_dir().as_path()) {
            debug!(target: "orchestrator", "Keeping {}", old_dir.display());
            return;
        }

        match tokio::fs::remove_dir_all(old_dir).await {
            Ok(()) => debug!(target: "orchestrator", "Removed {}", old_dir.display()),
            Err(e) => self.report(&DeployError::StaleUpdaterCleanup {
                path: old_dir.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Reject version strings that cannot safely name a sibling build folder.
fn validate_new_version(new_version: &str, installed: &str) -> Result<(), String> {
    if new_version.is_empty() {
        return Err("updater reported an empty version".to_string());
    }
    if new_version.starts_with('#') {
        return Err(format!("updater reported '{new_version}' instead of a version"));
    }
    if new_version.contains(['/', '\\']) || new_version.contains("..") || new_version.contains('\n')
    {
        return Err("version is not a valid folder name".to_string());
    }
    if new_version == installed {
        return Err("reported version is the installed version".to_string());
    }
    Ok(())
}
