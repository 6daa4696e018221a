// ============================================================================
// framegrab-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: terminal progress bar for frame extraction
//
// The core calls a ProgressReporter once per completed frame, from worker
// threads in parallel mode. This module renders those calls as an indicatif
// progress bar over the sampled frames. The bar is only drawn in verbose mode.

// ---- External crate imports ----
use framegrab_core::{ProgressReporter, ProgressState, UnitOutcome};
use indicatif::{ProgressBar, ProgressStyle};

// ---- Standard library imports ----
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Progress bar reporter. Safe to share across rayon workers.
pub struct CliProgressReporter {
    bar: ProgressBar,
}

impl CliProgressReporter {
    /// Creates a reporter for `total` sampled frames, drawn only when `visible`.
    pub fn new(total: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .map(|s| s.progress_chars("█▓▒░ "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message("Extracting frames");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Number of frames reported so far.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Clears the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for CliProgressReporter {
    fn on_unit_complete(&self, _ordinal: u64, _outcome: UnitOutcome, state: ProgressState) {
        self.bar.set_message(format!(
            "saved {} / skipped {}",
            state.saved_frames, state.skipped_frames
        ));
        self.bar.inc(1);
    }

    fn on_unit_unreadable(&self, ordinal: u64) {
        self.bar.println(format!("frame {ordinal} could not be read"));
        self.bar.inc(1);
    }
}
