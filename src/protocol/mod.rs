//! Subprocess protocol spoken with the external updater executable.
//!
//! The updater is a separate, versioned program. This crate only knows its
//! command-line grammar and the sentinel-prefixed text it prints:
//!
//! | Invocation | stdout |
//! |---|---|
//! | `--check <version> --repository <repo> --product <name>` | `#LATEST`, `#UPDATE` or `#ERROR ... [TransientError]` |
//! | `--read version\|releasenotes --repository <repo> --product <name>` | raw text |
//! | `--install <dir> --repository <repo> --product <name> [--kill <pid>] [--start <path> --args <arg>...]` | unspecified |
//!
//! - [`command`] - [`UpdaterCommand`] builder and process execution
//! - [`response`] - [`ProtocolResponse`] classification
//! - [`client`] - [`UpdaterClient`], the typed entry point used by the orchestrator

pub mod client;
pub mod command;
pub mod response;

pub use client::UpdaterClient;
pub use command::{ReadTopic, UpdaterCommand};
pub use response::{ProtocolResponse, parse_read_output};
