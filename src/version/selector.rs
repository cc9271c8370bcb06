use crate::version::comparison::latest;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One installed updater build: a folder named after its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: String,
    pub path: PathBuf,
}

/// Pick the newest build folder directly below `versions_dir`.
///
/// The directory is listed fresh on every call; installs mutate it out of band.
/// A missing, unreadable or empty directory yields `None`, which callers treat
/// as "no updater installed". Plain files and names that are not valid UTF-8
/// are ignored.
pub async fn select_latest(versions_dir: &Path) -> Option<VersionEntry> {
    let mut entries = match tokio::fs::read_dir(versions_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(
                target: "version",
                "Cannot list updater versions in {}: {}",
                versions_dir.display(),
                e
            );
            return None;
        }
    };

    let mut names = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!(target: "version", "Stopped listing {}: {}", versions_dir.display(), e);
                break;
            }
        };

        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_dir {
            names.push(name);
        }
    }

    let version = latest(names.iter().map(String::as_str))?;
    debug!(target: "version", "Selected updater version {}", version);
    Some(VersionEntry {
        path: versions_dir.join(version),
        version: version.to_string(),
    })
}
