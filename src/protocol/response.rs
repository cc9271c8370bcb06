//! Sentinel grammar of the updater's stdout.
//!
//! All call sites classify output through this module so the `--check` path and
//! the self-update path can never drift apart.

use crate::constants::{SENTINEL_ERROR, SENTINEL_LATEST, SENTINEL_UPDATE, TRANSIENT_ERROR_MARKER};
use crate::core::DeployError;

/// Classified answer of one `--check` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolResponse {
    /// `#ERROR ...`; `transient` when the text mentions `TransientError`.
    Error { transient: bool, message: String },
    /// `#LATEST`
    Latest,
    /// `#UPDATE`
    UpdateAvailable,
    /// Anything else, kept verbatim.
    Unexpected(String),
}

impl ProtocolResponse {
    /// Classify raw stdout. Leading whitespace is ignored.
    pub fn parse(stdout: &str) -> Self {
        let text = stdout.trim_start();
        if text.starts_with(SENTINEL_ERROR) {
            Self::Error {
                transient: text.contains(TRANSIENT_ERROR_MARKER),
                message: text.trim_end().to_string(),
            }
        } else if text.starts_with(SENTINEL_LATEST) {
            Self::Latest
        } else if text.starts_with(SENTINEL_UPDATE) {
            Self::UpdateAvailable
        } else {
            Self::Unexpected(stdout.trim().to_string())
        }
    }

    /// Reduce the response to "is an update available".
    ///
    /// Every non-sentinel answer becomes an error so the caller reports it; the
    /// caller's safe default for any error is `false`.
    pub fn into_update_available(self) -> Result<bool, DeployError> {
        match self {
            Self::Latest => Ok(false),
            Self::UpdateAvailable => Ok(true),
            Self::Error { transient, message } => Err(protocol_error(transient, message)),
            Self::Unexpected(response) => Err(DeployError::UnexpectedProtocolResponse { response }),
        }
    }
}

/// Interpret the output of an informational `--read` call.
///
/// The text is opaque unless it carries the error sentinel, in which case it is
/// classified exactly like a `--check` error.
pub fn parse_read_output(stdout: &str) -> Result<String, DeployError> {
    match ProtocolResponse::parse(stdout) {
        ProtocolResponse::Error { transient, message } => Err(protocol_error(transient, message)),
        _ => Ok(stdout.trim_end().to_string()),
    }
}

fn protocol_error(transient: bool, response: String) -> DeployError {
    if transient {
        DeployError::TransientProtocolError { response }
    } else {
        DeployError::FatalProtocolError { response }
    }
}
