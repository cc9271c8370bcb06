//! Error handling for clientdeploy
//!
//! Two layers, following the same split as the rest of the crate:
//! 1. [`DeployError`] - strongly-typed failures. The orchestrator never lets
//!    these escape to the host application; it hands them to the warning
//!    callback instead and moves its readiness state accordingly.
//! 2. [`ErrorContext`] - wrapper used by the command-line host to print an
//!    error together with details and an actionable suggestion.
//!
//! # Classification
//!
//! | Variant | Effect on readiness |
//! |---|---|
//! | `ConfigurationMissing`, `ConfigurationIncomplete` | not ready until reconnect |
//! | `UpdaterBinaryMissing` | not ready until reconnect |
//! | `ProcessLaunchFailure` | none, the query answers with its safe default |
//! | `TransientProtocolError` | none, the next tick retries |
//! | `FatalProtocolError` | not ready until reconnect |
//! | `UnexpectedProtocolResponse` | none, treated as "no update" |
//! | `SelfUpdateInstallFailure` | not ready, next tick reconnects |

use crate::core::readiness::{NotReadyReason, Readiness};
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Every failure the update subsystem can report.
///
/// The `Display` form of each variant is the warning text handed to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error(
        "Configuration file for this installation not found at '{path}'. This software will not receive automated updates!"
    )]
    ConfigurationMissing { path: String },

    #[error(
        "Configuration file for this installation has no '{key}' entry. This software will not receive automated updates!"
    )]
    ConfigurationIncomplete { key: String },

    #[error(
        "Updater executable not found at '{path}'. This software will not receive automated updates!"
    )]
    UpdaterBinaryMissing { path: String },

    #[error("Unable to start updater at '{path}': {reason}")]
    ProcessLaunchFailure { path: String, reason: String },

    #[error("Unable to access updates at the moment... ({response})")]
    TransientProtocolError { response: String },

    #[error(
        "Error in update system. This software will not receive automated updates! ({response})"
    )]
    FatalProtocolError { response: String },

    #[error("Unexpected response from update system: {response}")]
    UnexpectedProtocolResponse { response: String },

    #[error("Updater self-update to version '{version}' failed: {reason}")]
    SelfUpdateInstallFailure { version: String, reason: String },

    #[error("Could not remove previous updater build at '{path}': {reason}")]
    StaleUpdaterCleanup { path: String, reason: String },

    #[error("Update system not functioning ({state}). This software will not receive updates!")]
    NotReady { state: Readiness },

    #[error("Invalid settings file {file}: {reason}")]
    SettingsParse { file: String, reason: String },

    #[error("File system error during {operation} on '{path}': {reason}")]
    Io {
        operation: String,
        path: String,
        reason: String,
    },

    #[error("{message}")]
    Other { message: String },
}

impl DeployError {
    /// Whether the failure is expected to clear up on its own by the next tick.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientProtocolError { .. })
    }

    /// The readiness reason this failure puts the orchestrator into, if any.
    #[must_use]
    pub const fn not_ready_reason(&self) -> Option<NotReadyReason> {
        match self {
            Self::ConfigurationMissing { .. } => Some(NotReadyReason::ConfigurationMissing),
            Self::ConfigurationIncomplete { .. } => Some(NotReadyReason::ConfigurationIncomplete),
            Self::UpdaterBinaryMissing { .. } => Some(NotReadyReason::UpdaterBinaryMissing),
            Self::FatalProtocolError { .. } => Some(NotReadyReason::FatalProtocolError),
            Self::SelfUpdateInstallFailure { .. } => Some(NotReadyReason::SelfUpdateFailed),
            _ => None,
        }
    }

    pub(crate) fn io(
        operation: impl Into<String>,
        path: &std::path::Path,
        error: &std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.display().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Error wrapper with a suggestion and details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: DeployError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: DeployError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(deploy_error) = error.downcast_ref::<DeployError>() {
        return create_error_context(deploy_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(DeployError::Other {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check that the install directory is writable by the current user");
    }

    ErrorContext::new(DeployError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: DeployError) -> ErrorContext {
    match &error {
        DeployError::ConfigurationMissing { .. } => ErrorContext::new(error)
            .with_suggestion("Run `clientdeploy setup <repo> <product> <target>` to install the product")
            .with_details("The configuration store is written by the installer next to the product"),
        DeployError::ConfigurationIncomplete { .. } => ErrorContext::new(error)
            .with_suggestion("Add the missing key as a `key|value` line or reinstall the product")
            .with_details("Required keys are uuid, repo, product and version"),
        DeployError::UpdaterBinaryMissing { .. } => ErrorContext::new(error)
            .with_suggestion("Reinstall the product to restore the updater")
            .with_details("Updater builds live under .clientdeploy/updater/<version>/"),
        DeployError::ProcessLaunchFailure { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the updater executable exists and has execute permission"),
        DeployError::TransientProtocolError { .. } => ErrorContext::new(error)
            .with_suggestion("Try again later; the repository may be temporarily unreachable"),
        DeployError::SettingsParse { .. } => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax of the settings file"),
        _ => ErrorContext::new(error),
    }
}
