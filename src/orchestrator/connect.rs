use super::Inner;
use super::state::{State, UpdaterBinaryHandle};
use crate::config::InstallationDescriptor;
use crate::core::{DeployError, NotReadyReason, Readiness};
use crate::version::select_latest;
use tracing::info;

impl Inner {
    /// The connect procedure.
    ///
    /// Every failure is reported exactly once and leaves the state not ready
    /// with nothing from a previous connection retained.
    pub(super) async fn connect(&self, state: &mut State) -> Readiness {
        if self.is_closed() {
            state.reset(Readiness::NotReady(NotReadyReason::ShutDown));
            return state.readiness;
        }

        let descriptor = match InstallationDescriptor::load(&self.install_root).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                let reason = e.not_ready_reason().unwrap_or(NotReadyReason::ConfigurationMissing);
                state.reset(Readiness::NotReady(reason));
                self.report(&e);
                return state.readiness;
            }
        };

        let versions_dir = self.versions_dir();
        let Some(entry) = select_latest(&versions_dir).await else {
            state.reset(Readiness::NotReady(NotReadyReason::UpdaterBinaryMissing));
            self.report(&DeployError::UpdaterBinaryMissing {
                path: versions_dir.display().to_string(),
            });
            return state.readiness;
        };

        let executable_path = entry.path.join(self.settings.updater_file_name());
        if !tokio::fs::try_exists(&executable_path).await.unwrap_or(false) {
            state.reset(Readiness::NotReady(NotReadyReason::UpdaterBinaryMissing));
            self.report(&DeployError::UpdaterBinaryMissing {
                path: executable_path.display().to_string(),
            });
            return state.readiness;
        }

        info!(
            target: "orchestrator",
            "Connected {} {} using updater {}",
            descriptor.product,
            descriptor.product_version,
            entry.version
        );
        state.descriptor = Some(descriptor);
        state.handle = Some(UpdaterBinaryHandle {
            installed_version: entry.version,
            executable_path,
        });
        state.readiness = Readiness::Ready;

        self.self_update(state).await;
        state.readiness
    }
}
