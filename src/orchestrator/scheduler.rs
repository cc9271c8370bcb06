//! Periodic background checks.
//!
//! One Tokio task per schedule. Each tick is awaited to completion before the
//! interval is polled again, and missed ticks are skipped, so two ticks can
//! never run at the same time even when one outlasts the interval.

use super::Inner;
use super::state::UpdateAvailableCallback;
use crate::core::{DeployError, Readiness};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Shortest accepted tick interval; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A running schedule.
pub(super) struct PeriodicChecks {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PeriodicChecks {
    pub(super) fn start(
        inner: Arc<Inner>,
        interval: Duration,
        on_update_available: UpdateAvailableCallback,
    ) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let (stop, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(target: "orchestrator", "Periodic checks every {:?}", interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stopped.changed() => break,
                }
                if *stopped.borrow() || inner.is_closed() {
                    break;
                }

                // A panic anywhere in the tick surfaces here as a JoinError.
                let tick = tokio::spawn(Arc::clone(&inner).tick(Arc::clone(&on_update_available)));
                if let Err(e) = tick.await {
                    let message = if e.is_panic() {
                        panic_message(e.into_panic())
                    } else {
                        e.to_string()
                    };
                    inner.report(&DeployError::Other {
                        message: format!("Update check failed unexpectedly: {message}"),
                    });
                    inner.state.lock().await.reset(Readiness::Disconnected);
                }
            }
            debug!(target: "orchestrator", "Periodic checks stopped");
        });

        Self { stop, task }
    }

    /// Signal the loop to end after any in-flight tick.
    pub(super) fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub(super) async fn stop_and_wait(self) {
        self.stop();
        let _ = self.task.await;
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic".to_string()
    }
}

impl Inner {
    /// One tick: reconnect if needed, self-update, then check the product.
    ///
    /// The host callback runs after the lock is released so it may call back
    /// into the orchestrator (for example to read the new version or hand off).
    async fn tick(self: Arc<Self>, on_update_available: UpdateAvailableCallback) {
        let available = {
            let mut state = self.state.lock().await;
            if self.is_closed() {
                return;
            }

            if state.readiness.is_ready() {
                self.self_update(&mut state).await;
            } else {
                trace!(target: "orchestrator", "Tick reconnecting from {}", state.readiness);
                // connect() already ran the self-update step
                self.connect(&mut state).await;
            }

            if !state.readiness.is_ready() {
                return;
            }
            self.check_product(&mut state).await
        };

        if available {
            on_update_available();
        }
    }
}
