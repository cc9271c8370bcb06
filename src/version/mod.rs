//! Version ordering and selection of installed updater builds.
//!
//! - [`comparison`] - the padded-segment comparator shared by every call site
//! - [`selector`] - [`select_latest`] over a directory of version folders

pub mod comparison;
pub mod selector;

pub use comparison::{VersionKey, compare_versions, latest};
pub use selector::{VersionEntry, select_latest};
