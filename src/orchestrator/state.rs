use crate::config::InstallationDescriptor;
use crate::core::{DeployError, Readiness};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback receiving every warning the update subsystem reports.
///
/// Must not panic; it runs on whichever task hit the problem, including the
/// periodic timer task.
pub type WarningCallback = Arc<dyn Fn(&DeployError) + Send + Sync>;

/// Callback fired from the timer task when the product has an update.
pub type UpdateAvailableCallback = Arc<dyn Fn() + Send + Sync>;

/// The updater build currently trusted to talk to the repository.
///
/// Replaced as a whole value when a self-update completes; never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdaterBinaryHandle {
    pub installed_version: String,
    pub executable_path: PathBuf,
}

impl UpdaterBinaryHandle {
    /// Folder of this build, i.e. `.clientdeploy/updater/<version>`.
    pub fn build_dir(&self) -> Option<&Path> {
        self.executable_path.parent()
    }
}

/// Everything guarded by the orchestrator's lock.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub readiness: Readiness,
    pub descriptor: Option<InstallationDescriptor>,
    pub handle: Option<UpdaterBinaryHandle>,
}

impl State {
    /// Descriptor and handle, but only while ready.
    pub fn ready_parts(&self) -> Option<(&InstallationDescriptor, &UpdaterBinaryHandle)> {
        if !self.readiness.is_ready() {
            return None;
        }
        Some((self.descriptor.as_ref()?, self.handle.as_ref()?))
    }

    /// Forget everything learned by the last connect.
    pub fn reset(&mut self, readiness: Readiness) {
        self.readiness = readiness;
        self.descriptor = None;
        self.handle = None;
    }
}
