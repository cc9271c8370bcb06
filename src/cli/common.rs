//! Pieces shared by the orchestrator-driving commands.

use super::CliConfig;
use crate::config::Settings;
use crate::core::DeployError;
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// `--root` option.
#[derive(Args, Debug, Clone, Default)]
pub struct RootArgs {
    /// Installation root (defaults to the folder of this executable)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl RootArgs {
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        let exe = std::env::current_exe().context("Failed to get current executable path")?;
        exe.parent()
            .map(std::path::Path::to_path_buf)
            .context("Current executable has no parent folder")
    }
}

/// Load the settings named by `--settings`, or the defaults.
pub async fn load_settings(config: &CliConfig) -> Result<Settings> {
    Settings::load_with_optional(config.settings_path.as_deref())
        .await
        .context("Failed to load settings")
}

/// Warning sink printing `WARNING: <message>` to stderr.
pub fn print_warning(warning: &DeployError) {
    eprintln!("{}", format!("WARNING: {warning}").yellow());
}

/// Orchestrator for `--root` with warnings going to stderr.
pub async fn open_orchestrator(root: &RootArgs, config: &CliConfig) -> Result<Orchestrator> {
    let root = root.resolve()?;
    let settings = load_settings(config).await?;
    Ok(Orchestrator::new(root, settings, print_warning))
}
