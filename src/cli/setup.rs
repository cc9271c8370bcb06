use super::CliConfig;
use super::common::load_settings;
use crate::setup::{SetupRequest, run_setup};
use crate::utils::Spinner;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Install the updater into TARGET and let it install PRODUCT.
#[derive(Args, Debug)]
pub struct SetupCommand {
    /// Deployment repository URL
    #[arg(value_name = "REPOSITORY")]
    repository: String,

    /// Product to install
    #[arg(value_name = "PRODUCT")]
    product: String,

    /// Installation folder
    #[arg(value_name = "TARGET")]
    target: PathBuf,
}

impl SetupCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let settings = load_settings(config).await?;
        let request = SetupRequest {
            repository: self.repository,
            product: self.product,
            target: self.target,
        };

        let spinner = Spinner::new(
            config.show_progress(),
            format!("Downloading {}", request.archive_url()),
        );
        let result = run_setup(&request, &settings).await;
        spinner.finish_and_clear();
        let executable = result?;

        println!(
            "{}",
            format!(
                "Installing {} into {} with {}",
                request.product,
                request.target.display(),
                executable.display()
            )
            .green()
        );
        Ok(())
    }
}
