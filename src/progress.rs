//! Spinner shown while waiting for the package manager lock

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::locks::LockInfo;

/// Progress display for lock waits
pub struct LockWaitDisplay {
    spinner: ProgressBar,
}

impl LockWaitDisplay {
    /// Create a spinner on stderr; hidden when `visible` is false
    pub fn new(visible: bool) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let spinner = ProgressBar::with_draw_target(None, target);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(120));

        Self { spinner }
    }

    /// Show the current lock holder
    pub fn update(&self, info: &LockInfo) {
        self.spinner
            .set_message(format!("Waiting for package manager lock: {}", info.describe()));
    }

    /// Clear the spinner once the lock is free
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    /// Leave the last message on screen after giving up
    pub fn abandon(&self) {
        self.spinner.abandon();
    }
}

impl Drop for LockWaitDisplay {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
