//! Per-installation configuration store.
//!
//! The installer writes `.clientdeploy.config` into the install root. It is a
//! flat list of `key|value` lines; lines starting with `#` are comments:
//!
//! ```text
//! # written by clientdeploy setup
//! uuid|8f14e45f-ceea-467f-a0e6-0d7b4c1f2a9e
//! repo|https://deploy.example.com/repo
//! product|Example
//! version|1.4.2
//! ```

use crate::constants::CONFIG_FILE_NAME;
use crate::core::{DeployError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Keys every installation must define, in the order they are validated.
const REQUIRED_KEYS: [&str; 4] = ["uuid", "repo", "product", "version"];

/// Immutable snapshot of an installation, loaded once at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallationDescriptor {
    pub uuid: String,
    pub product_version: String,
    pub repository: String,
    pub product: String,
}

impl InstallationDescriptor {
    /// Load the descriptor from `<install_root>/.clientdeploy.config`.
    pub async fn load(install_root: &Path) -> Result<Self> {
        let path = install_root.join(CONFIG_FILE_NAME);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeployError::ConfigurationMissing {
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(DeployError::io("reading configuration", &path, &e)),
        };

        Self::parse(&content)
    }

    /// Parse the `key|value` store.
    ///
    /// Values keep everything after the first `|`, so repository URLs may contain
    /// further pipes. Empty values are treated as missing.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries: HashMap<&str, &str> = HashMap::new();

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('|') else {
                debug!(target: "config", "Ignoring malformed configuration line: {}", line);
                continue;
            };
            entries.insert(key.trim(), value.trim());
        }

        for key in REQUIRED_KEYS {
            if entries.get(key).is_none_or(|value| value.is_empty()) {
                return Err(DeployError::ConfigurationIncomplete {
                    key: key.to_string(),
                });
            }
        }

        Ok(Self {
            uuid: entries["uuid"].to_string(),
            product_version: entries["version"].to_string(),
            repository: entries["repo"].to_string(),
            product: entries["product"].to_string(),
        })
    }
}
