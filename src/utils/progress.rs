//! Spinner for operations without a known length.
//!
//! Hidden when progress output is disabled (`--quiet`, `--no-progress`), so
//! scripted runs get clean output.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A steady-ticking spinner with a message.
#[derive(Clone)]
pub struct Spinner {
    inner: ProgressBar,
}

impl Spinner {
    /// Start a spinner; `visible = false` yields a hidden one.
    pub fn new(visible: bool, message: impl Into<String>) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(message.into());
        Self { inner: bar }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}
