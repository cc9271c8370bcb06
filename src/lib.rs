//! clientdeploy - self-update orchestration for deployed applications
//!
//! A product installed by clientdeploy ships with an external, versioned
//! updater executable. This crate embeds into the product and decides, on a
//! schedule, whether the product has a newer build, keeps the updater itself
//! current, and hands the process over to the updater when it is time to
//! install.
//!
//! # Installation layout
//!
//! ```text
//! <install root>/
//! ├── .clientdeploy.config            key|value store: uuid, repo, product, version
//! └── .clientdeploy/
//!     └── updater/
//!         ├── 1.9.0/clientdeploy-updater
//!         └── 1.10.0/clientdeploy-updater   <- newest build is used
//! ```
//!
//! # Modules
//!
//! - [`orchestrator`] - readiness state machine, periodic checks, self-update and handoff
//! - [`protocol`] - command-line contract and stdout sentinels of the updater
//! - [`version`] - version ordering and selection of installed updater builds
//! - [`config`] - installation descriptor and orchestrator settings
//! - [`setup`] - first-time bootstrap installer
//! - [`core`] - error taxonomy and readiness types
//! - [`cli`] - the `clientdeploy` command-line host
//! - [`utils`] - terminal helpers

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod orchestrator;
pub mod protocol;
pub mod setup;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
