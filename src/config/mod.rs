//! Configuration sources for the update subsystem.
//!
//! - [`descriptor`] - the per-installation `.clientdeploy.config` store, read
//!   once per connect into an immutable [`InstallationDescriptor`]
//! - [`settings`] - tunables for the orchestrator ([`Settings`]), optionally
//!   loaded from a TOML file

pub mod descriptor;
pub mod settings;

pub use descriptor::InstallationDescriptor;
pub use settings::Settings;
