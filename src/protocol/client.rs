use crate::core::Result;
use crate::protocol::command::{ReadTopic, UpdaterCommand};
use crate::protocol::response::{ProtocolResponse, parse_read_output};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Talks to one updater executable over its command-line contract.
///
/// Cheap to construct; the orchestrator builds one per call from the current
/// [`UpdaterBinaryHandle`](crate::orchestrator::UpdaterBinaryHandle) so a swapped
/// handle is picked up immediately.
#[derive(Debug, Clone)]
pub struct UpdaterClient {
    executable: PathBuf,
    call_timeout: Duration,
}

impl UpdaterClient {
    pub fn new(executable: impl Into<PathBuf>, call_timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            call_timeout,
        }
    }

    /// Ask whether `product` has a build newer than `version`.
    pub async fn check(
        &self,
        version: &str,
        repository: &str,
        product: &str,
    ) -> Result<ProtocolResponse> {
        let stdout = UpdaterCommand::check(&self.executable, version, repository, product)
            .with_timeout(Some(self.call_timeout))
            .execute()
            .await?;
        Ok(ProtocolResponse::parse(&stdout))
    }

    /// Read informational text about the newest build of `product`.
    pub async fn read(&self, topic: ReadTopic, repository: &str, product: &str) -> Result<String> {
        let stdout = UpdaterCommand::read(&self.executable, topic, repository, product)
            .with_timeout(Some(self.call_timeout))
            .execute()
            .await?;
        parse_read_output(&stdout)
    }

    /// Install `product` into `target` and wait at most `wait` for it.
    pub async fn install_and_wait(
        &self,
        target: &Path,
        repository: &str,
        product: &str,
        wait: Duration,
    ) -> Result<()> {
        UpdaterCommand::install(&self.executable, target, repository, product)
            .with_timeout(Some(wait))
            .execute()
            .await
            .map(|_| ())
    }
}
