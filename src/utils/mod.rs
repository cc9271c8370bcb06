//! Terminal helpers shared by the command-line host.
//!
//! - [`progress`] - spinners for long-running operations

pub mod progress;

pub use progress::Spinner;
