use super::CliConfig;
use super::common::{RootArgs, open_orchestrator};
use crate::utils::Spinner;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Connect to an installation and check once for a newer build.
#[derive(Args, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    root: RootArgs,
}

impl CheckCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let orchestrator = open_orchestrator(&self.root, config).await?;

        let spinner = Spinner::new(config.show_progress(), "Connecting to the updater...");
        orchestrator.connect().await;
        spinner.set_message("Checking for updates...");
        let available = orchestrator.check_updates_available().await;
        spinner.finish_and_clear();

        if available {
            let version = orchestrator.available_version().await;
            let notes = orchestrator.available_version_release_notes().await;
            println!("{}", format!("Update available: {version}").green());
            if !notes.is_empty() {
                println!("\n{notes}");
            }
        } else {
            println!("No update available");
        }

        orchestrator.shutdown().await;
        Ok(())
    }
}
