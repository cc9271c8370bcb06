//! Command-line host for the update orchestrator.
//!
//! The `clientdeploy` binary drives an [`Orchestrator`](crate::orchestrator::Orchestrator)
//! against an existing installation, or bootstraps a new one.
//!
//! # Commands
//!
//! - `status` - connect and print readiness, installation and updater build
//! - `check` - connect and ask the repository for a newer product build
//! - `watch` - check periodically until Ctrl-C, optionally handing over to the updater
//! - `setup` - install the updater and let it install a product
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - no logging and no spinners
//! - `--no-progress` - no spinners
//! - `--settings <FILE>` - orchestrator settings in TOML
//!
//! ```bash
//! clientdeploy status --root /opt/example --format json
//! clientdeploy watch --interval 600 --apply
//! clientdeploy setup https://deploy.example.com/repo Example ./example
//! ```

mod check;
pub mod common;
mod setup;
mod status;
mod watch;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime options derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Filter directive for the tracing subscriber; `None` disables logging.
    pub log_level: Option<String>,

    /// Hide spinners.
    pub no_progress: bool,

    /// Settings file to load instead of the defaults.
    pub settings_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    #[must_use]
    pub const fn with_no_progress(mut self, no_progress: bool) -> Self {
        self.no_progress = no_progress;
        self
    }

    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured level. Does nothing if a
    /// subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = match (&self.log_level, std::env::var("RUST_LOG")) {
            (_, Ok(directives)) if !directives.is_empty() => EnvFilter::new(directives),
            (Some(level), _) => EnvFilter::new(level),
            (None, _) => return,
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub const fn show_progress(&self) -> bool {
        !self.no_progress
    }
}

#[derive(Parser)]
#[command(
    name = "clientdeploy",
    about = "Keep a deployed application and its updater up to date",
    version,
    long_about = "clientdeploy checks a deployment repository for newer builds of an installed \
                  product, keeps the clientdeploy updater current and hands over to it for installs."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress everything except results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable spinners
    #[arg(long, global = true)]
    no_progress: bool,

    /// Orchestrator settings file (TOML)
    #[arg(long, global = true, value_name = "FILE", env = "CLIENTDEPLOY_SETTINGS")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the state of an installation
    Status(status::StatusCommand),

    /// Check once whether a newer build is available
    Check(check::CheckCommand),

    /// Check periodically until interrupted
    Watch(watch::WatchCommand),

    /// Install the updater and let it install a product
    Setup(setup::SetupCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress || self.quiet,
            settings_path: self.settings.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Status(cmd) => cmd.execute(&config).await,
            Commands::Check(cmd) => cmd.execute(&config).await,
            Commands::Watch(cmd) => cmd.execute(&config).await,
            Commands::Setup(cmd) => cmd.execute(&config).await,
        }
    }
}
