//! Global constants used throughout the clientdeploy codebase.
//!
//! This module contains file layout names, timeout durations and protocol
//! sentinels that are shared between the orchestrator, the protocol client
//! and the bootstrap installer. Defining them centrally keeps every call site
//! agreeing on the same on-disk layout.

use std::time::Duration;

/// Name of the per-installation configuration store in the install root.
pub const CONFIG_FILE_NAME: &str = ".clientdeploy.config";

/// Directory (relative to the install root) holding all deployment state.
pub const DEPLOY_DIR_NAME: &str = ".clientdeploy";

/// Directory (relative to [`DEPLOY_DIR_NAME`]) with one folder per installed updater build.
pub const UPDATER_DIR_NAME: &str = "updater";

/// Archive published at the repository root by the bootstrap installer.
pub const BOOTSTRAP_ARCHIVE_NAME: &str = "clientdeploy.zip";

/// Product name the repository reserves for the updater itself.
pub const UPDATER_PRODUCT_NAME: &str = "clientdeploy";

/// Base file name of the updater executable inside a version folder.
pub const UPDATER_EXECUTABLE_NAME: &str = "clientdeploy-updater";

/// Width every numeric version segment is zero-padded to before comparison.
///
/// Ten digits covers any `u32` segment.
pub const VERSION_SEGMENT_WIDTH: usize = 10;

/// Upper bound for the blocking wait on an updater self-install (45 seconds).
pub const SELF_UPDATE_INSTALL_TIMEOUT: Duration = Duration::from_secs(45);

/// Timeout for `--check` and `--read` calls (2 minutes).
///
/// Expiry is reported as a transient protocol error so the next tick retries.
pub const PROTOCOL_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Default interval between periodic update checks (1 hour).
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Sentinel prefix of an error response.
pub const SENTINEL_ERROR: &str = "#ERROR";

/// Marker inside an error response that makes it retry-eligible.
pub const TRANSIENT_ERROR_MARKER: &str = "TransientError";

/// Sentinel prefix of a "no update" response.
pub const SENTINEL_LATEST: &str = "#LATEST";

/// Sentinel prefix of an "update available" response.
pub const SENTINEL_UPDATE: &str = "#UPDATE";

/// Placeholder returned by informational queries when the subsystem is not ready.
pub const NOT_FUNCTIONING_MESSAGE: &str =
    "Update system not functioning. This software will not receive updates!";

/// Placeholder returned by informational queries when the updater cannot be launched.
pub const UNAVAILABLE_MESSAGE: &str = "Update system unavailable at the moment...";

/// Message passed to the notification callback right before a handoff.
pub const HANDOFF_NOTICE: &str = "Beginning update...";
