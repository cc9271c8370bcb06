use super::CliConfig;
use super::common::{RootArgs, open_orchestrator};
use crate::orchestrator::ProcessInvocation;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Check periodically until interrupted.
#[derive(Args, Debug)]
pub struct WatchCommand {
    #[command(flatten)]
    root: RootArgs,

    /// Seconds between checks (defaults to the configured interval)
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Hand over to the updater as soon as an update is found
    #[arg(long)]
    apply: bool,
}

impl WatchCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let orchestrator = open_orchestrator(&self.root, config).await?;
        let interval = self
            .interval
            .map_or_else(|| orchestrator.settings().check_interval(), Duration::from_secs);

        orchestrator.connect().await;

        let (found_tx, mut found_rx) = mpsc::unbounded_channel();
        orchestrator.schedule_periodic_checks(interval, move || {
            let _ = found_tx.send(());
        });
        info!("Checking every {}s; press Ctrl-C to stop", interval.as_secs());

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    break;
                }
                Some(()) = found_rx.recv() => {
                    let version = orchestrator.available_version().await;
                    let notes = orchestrator.available_version_release_notes().await;
                    println!("{}", format!("Update available: {version}").green());
                    if !notes.is_empty() {
                        println!("\n{notes}");
                    }

                    if self.apply {
                        let invocation = ProcessInvocation::current()
                            .context("Failed to capture the current process")?;
                        let launched = orchestrator
                            .update_now(&invocation, |message| println!("{}", message.cyan()))
                            .await;
                        if launched {
                            break;
                        }
                    }
                }
            }
        }

        orchestrator.shutdown().await;
        Ok(())
    }
}
