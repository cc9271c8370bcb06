use super::CliConfig;
use super::common::{RootArgs, open_orchestrator};
use crate::config::InstallationDescriptor;
use crate::core::Readiness;
use crate::orchestrator::UpdaterBinaryHandle;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Connect to an installation and show its state.
#[derive(Args, Debug)]
pub struct StatusCommand {
    #[command(flatten)]
    root: RootArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub install_root: PathBuf,
    pub readiness: Readiness,
    pub installation: Option<InstallationDescriptor>,
    pub updater: Option<UpdaterBinaryHandle>,
}

impl StatusReport {
    pub fn render_text(&self) -> String {
        let readiness = if self.readiness.is_ready() {
            self.readiness.to_string().green()
        } else {
            self.readiness.to_string().yellow()
        };

        let mut out = format!("Installation: {}\nState:        {}\n", self.install_root.display(), readiness);
        if let Some(installation) = &self.installation {
            out.push_str(&format!(
                "Product:      {} {}\nRepository:   {}\n",
                installation.product, installation.product_version, installation.repository
            ));
        }
        if let Some(updater) = &self.updater {
            out.push_str(&format!(
                "Updater:      {} ({})\n",
                updater.installed_version,
                updater.executable_path.display()
            ));
        }
        out
    }
}

impl StatusCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let orchestrator = open_orchestrator(&self.root, config).await?;
        let readiness = orchestrator.connect().await;

        let report = StatusReport {
            install_root: orchestrator.install_root().to_path_buf(),
            readiness,
            installation: orchestrator.descriptor().await,
            updater: orchestrator.updater_handle().await,
        };
        orchestrator.shutdown().await;

        match self.format {
            OutputFormat::Text => print!("{}", report.render_text()),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize status")?;
                println!("{json}");
            }
        }
        Ok(())
    }
}
