//! Ordering of dot-separated version strings.
//!
//! Updater build folders are named after their version (`1.9.0`, `1.10.0`, ...).
//! Instead of a full semantic-version parser, each numeric segment is
//! left-padded with zeros to [`VERSION_SEGMENT_WIDTH`] digits and the padded
//! segments are compared lexicographically. That gives numeric ordering for
//! numeric segments (`9` < `10`) and a stable, total order for anything else.
//!
//! Every place that picks a version folder goes through [`compare_versions`];
//! the bootstrap installer and the periodic self-update must never disagree on
//! which build is the newest.

use crate::constants::VERSION_SEGMENT_WIDTH;
use std::cmp::Ordering;

/// Sort key of a version string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey(Vec<String>);

impl VersionKey {
    pub fn new(version: &str) -> Self {
        Self(version.split('.').map(pad_segment).collect())
    }
}

fn pad_segment(segment: &str) -> String {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        format!("{segment:0>width$}", width = VERSION_SEGMENT_WIDTH)
    } else {
        segment.to_string()
    }
}

/// Compare two version strings by their padded keys.
///
/// Versions with identical keys (`1.02` and `1.2`) fall back to plain string
/// order so the result is deterministic.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    VersionKey::new(a).cmp(&VersionKey::new(b)).then_with(|| a.cmp(b))
}

/// Pick the greatest version out of `versions`.
pub fn latest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().max_by(|a, b| compare_versions(a, b))
}
