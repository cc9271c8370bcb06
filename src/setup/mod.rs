//! First-time installation of a product.
//!
//! Runs once, outside the orchestrator's lifecycle:
//!
//! 1. create `<target>/.clientdeploy/updater`
//! 2. download `<repo>/clientdeploy.zip`
//! 3. extract it into the updater folder (entries are `<version>/<files>`)
//! 4. pick the newest updater build with the same selector the orchestrator uses
//! 5. launch `<updater> --install <target> --product <product> --repository <repo>`
//!
//! The updater then installs the product itself, including its configuration
//! store.

use crate::config::Settings;
use crate::constants::{BOOTSTRAP_ARCHIVE_NAME, DEPLOY_DIR_NAME, UPDATER_DIR_NAME};
use crate::protocol::UpdaterCommand;
use crate::version::select_latest;
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What to install and where.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub repository: String,
    pub product: String,
    pub target: PathBuf,
}

impl SetupRequest {
    /// URL of the bootstrap archive.
    pub fn archive_url(&self) -> String {
        format!("{}/{}", self.repository.trim_end_matches('/'), BOOTSTRAP_ARCHIVE_NAME)
    }
}

/// Install the updater and launch it to install the product.
///
/// Returns the path of the launched updater executable.
pub async fn run_setup(request: &SetupRequest, settings: &Settings) -> Result<PathBuf> {
    tokio::fs::create_dir_all(&request.target)
        .await
        .with_context(|| format!("Failed to create {}", request.target.display()))?;
    let target = tokio::fs::canonicalize(&request.target)
        .await
        .with_context(|| format!("Failed to resolve {}", request.target.display()))?;

    let deploy_dir = target.join(DEPLOY_DIR_NAME);
    let versions_dir = deploy_dir.join(UPDATER_DIR_NAME);
    info!(target: "setup", "Creating folder structure {}", versions_dir.display());
    tokio::fs::create_dir_all(&versions_dir)
        .await
        .with_context(|| format!("Failed to create {}", versions_dir.display()))?;

    let url = request.archive_url();
    let archive = download_archive(&url, &deploy_dir).await?;

    info!(target: "setup", "Extracting updater into {}", versions_dir.display());
    let archive_path = archive.path().to_path_buf();
    let extract_into = versions_dir.clone();
    tokio::task::spawn_blocking(move || extract_archive(&archive_path, &extract_into))
        .await
        .context("Extraction task failed")??;
    archive.close().context("Failed to remove temporary archive")?;

    let executable = locate_updater(&versions_dir, settings).await?;
    info!(target: "setup", "Installing {} from {}", request.product, executable.display());

    UpdaterCommand::install(&executable, &target, &request.repository, &request.product)
        .current_dir(&target)
        .spawn_detached()?;

    Ok(executable)
}

async fn download_archive(url: &str, dir: &Path) -> Result<tempfile::NamedTempFile> {
    info!(target: "setup", "Downloading {}", url);

    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?
        .error_for_status()
        .with_context(|| format!("Repository refused {url}"))?;
    let bytes = response.bytes().await.with_context(|| format!("Failed to read {url}"))?;
    debug!(target: "setup", "Downloaded {} bytes", bytes.len());

    let mut file = tempfile::Builder::new()
        .prefix("bootstrapper")
        .suffix(".zip")
        .tempfile_in(dir)
        .context("Failed to create temporary archive")?;
    file.write_all(&bytes).context("Failed to write temporary archive")?;
    file.flush()?;
    Ok(file)
}

/// Extract a bootstrap archive into `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid archive", archive.display()))?;
    zip.extract(dest)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    Ok(())
}

/// Newest extracted updater build, made executable.
async fn locate_updater(versions_dir: &Path, settings: &Settings) -> Result<PathBuf> {
    let Some(entry) = select_latest(versions_dir).await else {
        bail!("Archive contained no updater build under {}", versions_dir.display());
    };

    let executable = entry.path.join(settings.updater_file_name());
    if !tokio::fs::try_exists(&executable).await.unwrap_or(false) {
        bail!("Updater build {} has no {}", entry.version, settings.updater_file_name());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755))
            .await
            .with_context(|| format!("Failed to mark {} executable", executable.display()))?;
    }

    Ok(executable)
}
