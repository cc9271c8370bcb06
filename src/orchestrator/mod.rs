//! Update orchestration for a deployed product.
//!
//! The [`Orchestrator`] owns the readiness state of one installation and the
//! handle of the updater build it trusts. It decides when the updater has to
//! replace itself, asks the updater whether the product has a new build, and
//! hands the process over to the updater when the host decides to update.
//!
//! # State machine
//!
//! ```text
//! Disconnected ──connect ok──▶ Ready ──tick──▶ NotReady(SelfUpdating) ──▶ Ready
//!      ▲                         │
//!      └──── tick failure ◀──────┘   (any not-ready state reconnects on the next tick)
//! ```
//!
//! All state lives behind one `tokio::sync::Mutex`. Timer ticks and on-demand
//! calls from host threads take the same lock, so a product check can never run
//! against an updater binary that is being replaced.
//!
//! # Failure policy
//!
//! No operation returns an error to the host. Failures are handed to the
//! warning callback as [`DeployError`] values and move the readiness state;
//! boolean queries answer `false` and informational queries answer a
//! placeholder text.
//!
//! # Example
//!
//! ```rust,no_run
//! use clientdeploy::config::Settings;
//! use clientdeploy::orchestrator::{Orchestrator, ProcessInvocation};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let orchestrator = Orchestrator::new("/opt/example", Settings::default(), |warning| {
//!     eprintln!("WARNING: {warning}");
//! });
//! orchestrator.connect().await;
//!
//! if orchestrator.check_updates_available().await {
//!     println!("Version {}", orchestrator.available_version().await);
//!     orchestrator
//!         .update_now(&ProcessInvocation::current()?, |info| println!("... {info}"))
//!         .await;
//! }
//!
//! orchestrator.schedule_periodic_checks(Duration::from_secs(30), || {
//!     println!("An update is available");
//! });
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod connect;
mod handoff;
mod scheduler;
mod state;


pub use handoff::ProcessInvocation;
pub use state::{UpdateAvailableCallback, UpdaterBinaryHandle, WarningCallback};

use crate::config::{InstallationDescriptor, Settings};
use crate::constants::{
    DEPLOY_DIR_NAME, NOT_FUNCTIONING_MESSAGE, UNAVAILABLE_MESSAGE, UPDATER_DIR_NAME,
};
use crate::core::{DeployError, NotReadyReason, Readiness};
use crate::protocol::{ReadTopic, UpdaterClient};
use scheduler::PeriodicChecks;
use state::State;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// State shared between the orchestrator handle and its timer task.
pub(crate) struct Inner {
    install_root: PathBuf,
    settings: Settings,
    on_warning: WarningCallback,
    state: Mutex<State>,
    closed: AtomicBool,
}

impl Inner {
    /// Hand a failure to the host's warning callback.
    fn report(&self, error: &DeployError) {
        warn!(target: "orchestrator", "{}", error);
        (self.on_warning)(error);
    }

    /// Report a protocol failure and apply its readiness effect.
    ///
    /// Only a fatal protocol error changes state; everything else keeps the
    /// current readiness so the next tick simply asks again.
    fn absorb(&self, state: &mut State, error: DeployError) {
        self.report(&error);
        if matches!(error, DeployError::FatalProtocolError { .. }) {
            state.readiness = Readiness::NotReady(NotReadyReason::FatalProtocolError);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn versions_dir(&self) -> PathBuf {
        self.install_root.join(DEPLOY_DIR_NAME).join(UPDATER_DIR_NAME)
    }

    fn client_for(&self, handle: &UpdaterBinaryHandle) -> UpdaterClient {
        UpdaterClient::new(&handle.executable_path, self.settings.protocol_timeout())
    }

    /// Product `--check` against the current handle.
    async fn check_product(&self, state: &mut State) -> bool {
        let Some((descriptor, handle)) = state.ready_parts() else {
            self.report(&DeployError::NotReady {
                state: state.readiness,
            });
            return false;
        };

        let client = self.client_for(handle);
        let result = client
            .check(&descriptor.product_version, &descriptor.repository, &descriptor.product)
            .await
            .and_then(|response| response.into_update_available());

        match result {
            Ok(available) => {
                debug!(target: "orchestrator", "Product update available: {}", available);
                available
            }
            Err(e) => {
                self.absorb(state, e);
                false
            }
        }
    }

    /// Product `--read <topic>` against the current handle.
    async fn read_product(&self, state: &mut State, topic: ReadTopic) -> String {
        let Some((descriptor, handle)) = state.ready_parts() else {
            self.report(&DeployError::NotReady {
                state: state.readiness,
            });
            return NOT_FUNCTIONING_MESSAGE.to_string();
        };

        let client = self.client_for(handle);
        match client.read(topic, &descriptor.repository, &descriptor.product).await {
            Ok(text) => text,
            Err(e) => {
                self.absorb(state, e);
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

/// Self-update orchestrator for one installation.
///
/// Each instance owns its state exclusively; several orchestrators (for example
/// in tests) can coexist without interfering.
pub struct Orchestrator {
    inner: Arc<Inner>,
    periodic: std::sync::Mutex<Option<PeriodicChecks>>,
}

impl Orchestrator {
    /// Create a disconnected orchestrator for the installation at `install_root`.
    pub fn new<F>(install_root: impl Into<PathBuf>, settings: Settings, on_warning: F) -> Self
    where
        F: Fn(&DeployError) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                install_root: install_root.into(),
                settings,
                on_warning: Arc::new(on_warning),
                state: Mutex::new(State::default()),
                closed: AtomicBool::new(false),
            }),
            periodic: std::sync::Mutex::new(None),
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.inner.install_root
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub async fn readiness(&self) -> Readiness {
        self.inner.state.lock().await.readiness
    }

    /// The descriptor loaded by the last successful connect.
    pub async fn descriptor(&self) -> Option<InstallationDescriptor> {
        self.inner.state.lock().await.descriptor.clone()
    }

    /// The updater build currently in use.
    pub async fn updater_handle(&self) -> Option<UpdaterBinaryHandle> {
        self.inner.state.lock().await.handle.clone()
    }

    /// Load the installation, locate the newest updater build and bring the
    /// updater itself up to date.
    ///
    /// Returns the resulting readiness; failures are reported as warnings.
    pub async fn connect(&self) -> Readiness {
        let mut state = self.inner.state.lock().await;
        self.inner.connect(&mut state).await
    }

    /// Replace the updater with a newer build if the repository publishes one.
    pub async fn check_and_apply_self_update(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.readiness.is_ready() {
            self.inner.report(&DeployError::NotReady {
                state: state.readiness,
            });
            return;
        }
        self.inner.self_update(&mut state).await;
    }

    /// Whether the repository has a newer build of the product.
    ///
    /// `false` whenever the answer is uncertain.
    pub async fn check_updates_available(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        self.inner.check_product(&mut state).await
    }

    /// Version string of the newest product build, or a placeholder text.
    pub async fn available_version(&self) -> String {
        let mut state = self.inner.state.lock().await;
        self.inner.read_product(&mut state, ReadTopic::Version).await
    }

    /// Release notes of the newest product build, or a placeholder text.
    pub async fn available_version_release_notes(&self) -> String {
        let mut state = self.inner.state.lock().await;
        self.inner.read_product(&mut state, ReadTopic::ReleaseNotes).await
    }

    /// Start checking every `interval` on a background task.
    ///
    /// Ticks never overlap: the next one starts only after the previous one
    /// finished, and late ticks are skipped rather than queued. Calling this
    /// again replaces the previous schedule. Must be called inside a Tokio
    /// runtime.
    pub fn schedule_periodic_checks<F>(&self, interval: Duration, on_update_available: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let checks = PeriodicChecks::start(
            Arc::clone(&self.inner),
            interval,
            Arc::new(on_update_available),
        );

        let mut slot = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(checks) {
            previous.stop();
        }
    }

    /// Stop periodic checks and refuse further work.
    ///
    /// Waits for an in-flight tick to finish. A self-update that completes after
    /// this point is discarded.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);

        let periodic = self.periodic.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(periodic) = periodic {
            periodic.stop_and_wait().await;
        }

        self.inner.state.lock().await.reset(Readiness::NotReady(NotReadyReason::ShutDown));
        debug!(target: "orchestrator", "Orchestrator shut down");
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let slot = self.periodic.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(periodic) = slot.take() {
            periodic.stop();
        }
    }
}
