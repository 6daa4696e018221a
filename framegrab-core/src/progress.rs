// ============================================================================
// framegrab-core/src/progress.rs
// ============================================================================
//
// PROGRESS TRACKING: Shared counters and the progress.json checkpoint
//
// Every completed frame unit updates one mutex-guarded set of counters. When
// checkpointing is enabled the counters are serialized to `progress.json` in
// the output directory after every update, replacing the previous snapshot.
// The file is written for external observers only and is never read back.
//
// KEY COMPONENTS:
// - ProgressState: The three counters, serialized as JSON
// - UnitOutcome: How a processed frame unit ended
// - ProgressTracker: Mutex-guarded state with optional checkpoint file
// - ProgressReporter: Callback notified after each unit (e.g. a progress bar)
//
// The snapshot is written while the lock is held, so the file on disk always
// reflects a state that existed and concurrent writers cannot interleave.

use crate::config::PROGRESS_FILE_NAME;
use crate::error::CoreResult;
use crate::temp_files::create_temp_file;

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

// ============================================================================
// STATE
// ============================================================================

/// Counters for one run.
///
/// `saved_frames + skipped_frames <= processed_frames` at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub processed_frames: u64,
    pub skipped_frames: u64,
    pub saved_frames: u64,
}

/// Result of processing one frame unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Frame passed the gates and was written.
    Saved,
    /// Frame was rejected or could not be written.
    Skipped,
}

impl ProgressState {
    fn record(&mut self, outcome: UnitOutcome) {
        self.processed_frames += 1;
        match outcome {
            UnitOutcome::Saved => self.saved_frames += 1,
            UnitOutcome::Skipped => self.skipped_frames += 1,
        }
    }
}

// ============================================================================
// TRACKER
// ============================================================================

/// Mutex-guarded progress counters with an optional JSON checkpoint.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    checkpoint: Option<PathBuf>,
}

impl ProgressTracker {
    /// Tracker that only counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that also rewrites `path` after every update.
    pub fn with_checkpoint(path: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            checkpoint: Some(path.into()),
        }
    }

    /// Tracker for a run writing into `output_dir`; checkpoints only when `resume` is set.
    pub fn for_output_dir(output_dir: &Path, resume: bool) -> Self {
        if resume {
            Self::with_checkpoint(output_dir.join(PROGRESS_FILE_NAME))
        } else {
            Self::new()
        }
    }

    pub fn checkpoint_path(&self) -> Option<&Path> {
        self.checkpoint.as_deref()
    }

    /// Records one finished unit and returns the updated counters.
    pub fn record(&self, outcome: UnitOutcome) -> ProgressState {
        let mut state = self.lock();
        state.record(outcome);
        let snapshot = *state;

        if let Some(path) = &self.checkpoint {
            if let Err(e) = write_snapshot(path, &snapshot) {
                log::warn!("Failed to update {}: {}", path.display(), e);
            }
        }
        snapshot
    }

    /// Current counters.
    pub fn snapshot(&self) -> ProgressState {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // Counters stay meaningful even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Replaces `path` with the JSON form of `state` via a sibling temp file.
fn write_snapshot(path: &Path, state: &ProgressState) -> CoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = create_temp_file(dir, ".progress", "tmp")?;
    serde_json::to_writer_pretty(temp.as_file_mut(), state)?;
    temp.as_file_mut().write_all(b"\n")?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ============================================================================
// REPORTER CALLBACK
// ============================================================================

/// Receives a notification after each frame unit completes.
///
/// Called from worker threads in parallel mode.
pub trait ProgressReporter: Send + Sync {
    fn on_unit_complete(&self, ordinal: u64, outcome: UnitOutcome, state: ProgressState);

    /// A sampled ordinal could not be read. It is not counted in [`ProgressState`].
    fn on_unit_unreadable(&self, _ordinal: u64) {}
}

/// Reporter that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn on_unit_complete(&self, _ordinal: u64, _outcome: UnitOutcome, _state: ProgressState) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counters() {
        let tracker = ProgressTracker::new();
        tracker.record(UnitOutcome::Saved);
        tracker.record(UnitOutcome::Skipped);
        let state = tracker.record(UnitOutcome::Skipped);

        assert_eq!(
            state,
            ProgressState {
                processed_frames: 3,
                skipped_frames: 2,
                saved_frames: 1,
            }
        );
        assert_eq!(tracker.snapshot(), state);
        assert!(tracker.checkpoint_path().is_none());
    }

    #[test]
    fn test_checkpoint_is_replaced_each_update() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ProgressTracker::for_output_dir(dir.path(), true);
        let path = dir.path().join("progress.json");
        assert_eq!(tracker.checkpoint_path(), Some(path.as_path()));

        tracker.record(UnitOutcome::Saved);
        tracker.record(UnitOutcome::Skipped);

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["processed_frames"], 2);
        assert_eq!(json["skipped_frames"], 1);
        assert_eq!(json["saved_frames"], 1);

        // Only the checkpoint remains; no stray temp files.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_no_checkpoint_without_resume() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ProgressTracker::for_output_dir(dir.path(), false);
        tracker.record(UnitOutcome::Saved);
        assert!(!dir.path().join("progress.json").exists());
    }

    #[test]
    fn test_unwritable_checkpoint_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"").unwrap();
        let tracker = ProgressTracker::with_checkpoint(blocker.join("progress.json"));
        let state = tracker.record(UnitOutcome::Skipped);
        assert_eq!(state.processed_frames, 1);
    }

    #[test]
    fn test_concurrent_updates_are_counted_once() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::for_output_dir(dir.path(), true));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        let outcome = if (i + j) % 3 == 0 {
                            UnitOutcome::Saved
                        } else {
                            UnitOutcome::Skipped
                        };
                        tracker.record(outcome);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = tracker.snapshot();
        assert_eq!(state.processed_frames, 200);
        assert_eq!(state.saved_frames + state.skipped_frames, 200);

        let text = std::fs::read_to_string(dir.path().join("progress.json")).unwrap();
        let on_disk: ProgressState = serde_json::from_str(&text).unwrap();
        assert_eq!(on_disk, state);
    }
}
