//! Core types shared by every layer of clientdeploy.
//!
//! - [`error`] - [`DeployError`] taxonomy and terminal rendering helpers
//! - [`readiness`] - [`Readiness`] state and [`NotReadyReason`]

pub mod error;
pub mod readiness;

pub use error::{DeployError, ErrorContext, user_friendly_error};
pub use readiness::{NotReadyReason, Readiness};

/// Result alias used by fallible operations inside the crate.
pub type Result<T, E = DeployError> = std::result::Result<T, E>;
