//! Readiness model of the update subsystem.

use serde::Serialize;
use std::fmt;

/// Why the update subsystem currently refuses product-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotReadyReason {
    /// `.clientdeploy.config` does not exist.
    ConfigurationMissing,
    /// `.clientdeploy.config` lacks a required key.
    ConfigurationIncomplete,
    /// No updater build is installed, or its executable is gone.
    UpdaterBinaryMissing,
    /// The updater is replacing itself right now.
    SelfUpdating,
    /// The last self-update did not produce the expected executable.
    SelfUpdateFailed,
    /// The updater answered with a non-transient `#ERROR`.
    FatalProtocolError,
    /// The orchestrator has been shut down.
    ShutDown,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ConfigurationMissing => "configuration missing",
            Self::ConfigurationIncomplete => "configuration incomplete",
            Self::UpdaterBinaryMissing => "updater binary missing",
            Self::SelfUpdating => "updater is updating itself",
            Self::SelfUpdateFailed => "updater self-update failed",
            Self::FatalProtocolError => "fatal updater error",
            Self::ShutDown => "shut down",
        };
        f.write_str(text)
    }
}

/// Readiness state owned by one orchestrator.
///
/// `Disconnected` is both the initial state and the state a failed tick falls
/// back to; the next tick then runs the full connect procedure again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Readiness {
    #[default]
    Disconnected,
    NotReady(NotReadyReason),
    Ready,
}

impl Readiness {
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::NotReady(reason) => write!(f, "not ready ({reason})"),
            Self::Ready => f.write_str("ready"),
        }
    }
}
