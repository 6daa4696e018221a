//! Frame selection policies.
//!
//! A policy maps the frame count and frame rate of a source to the ordered
//! list of frame ordinals that will be evaluated. `interval` and `all` are the
//! implemented strategies; `keyframes` and `scene` are accepted configuration
//! values without an algorithm and are rejected when a policy is requested.

use crate::config::{SelectionMethod, VideoConfig};
use crate::error::{CoreError, CoreResult};

/// Strategy that chooses which frame ordinals to sample.
pub trait SelectionPolicy: Send + Sync {
    /// Ordinals to process, ascending and unique, all `< total_frames`.
    fn select(&self, total_frames: u64, frame_rate: f64) -> Vec<u64>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Samples one frame every `interval_seconds`.
#[derive(Debug, Clone, Copy)]
pub struct IntervalSelection {
    pub interval_seconds: f64,
}

impl IntervalSelection {
    /// Distance in frames between samples: `round(fps * interval)`, at least 1.
    pub fn step(&self, frame_rate: f64) -> u64 {
        let step = (frame_rate * self.interval_seconds).round();
        if step.is_finite() && step >= 1.0 {
            step as u64
        } else {
            1
        }
    }
}

impl SelectionPolicy for IntervalSelection {
    fn select(&self, total_frames: u64, frame_rate: f64) -> Vec<u64> {
        let step = self.step(frame_rate);
        (0..total_frames).step_by(step as usize).collect()
    }

    fn name(&self) -> &'static str {
        "interval"
    }
}

/// Samples every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFramesSelection;

impl SelectionPolicy for AllFramesSelection {
    fn select(&self, total_frames: u64, _frame_rate: f64) -> Vec<u64> {
        (0..total_frames).collect()
    }

    fn name(&self) -> &'static str {
        "all"
    }
}

/// Builds the policy for the configured method.
///
/// Returns [`CoreError::UnsupportedSelection`] for methods that have no
/// algorithm, so a run never quietly samples with a different strategy.
pub fn policy_for(config: &VideoConfig) -> CoreResult<Box<dyn SelectionPolicy>> {
    match config.method {
        SelectionMethod::Interval => Ok(Box::new(IntervalSelection {
            interval_seconds: config.interval_seconds,
        })),
        SelectionMethod::All => Ok(Box::new(AllFramesSelection)),
        method @ (SelectionMethod::Keyframes | SelectionMethod::Scene) => {
            Err(CoreError::UnsupportedSelection(method.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_thirty_fps_five_seconds() {
        let policy = IntervalSelection {
            interval_seconds: 5.0,
        };
        assert_eq!(policy.step(30.0), 150);
        assert_eq!(policy.select(900, 30.0), vec![0, 150, 300, 450, 600, 750]);
    }

    #[test]
    fn test_interval_rounds_step() {
        let policy = IntervalSelection {
            interval_seconds: 1.0,
        };
        // 29.97 fps rounds to a 30 frame step
        assert_eq!(policy.step(29.97), 30);
        assert_eq!(policy.select(61, 29.97), vec![0, 30, 60]);
    }

    #[test]
    fn test_interval_minimum_step_is_one() {
        let policy = IntervalSelection {
            interval_seconds: 0.01,
        };
        assert_eq!(policy.step(10.0), 1);
        assert_eq!(policy.select(3, 10.0), vec![0, 1, 2]);
    }

    #[test]
    fn test_all_frames() {
        assert_eq!(AllFramesSelection.select(4, 25.0), vec![0, 1, 2, 3]);
        assert!(AllFramesSelection.select(0, 25.0).is_empty());
    }

    #[test]
    fn test_reserved_methods_are_rejected() {
        for method in [SelectionMethod::Keyframes, SelectionMethod::Scene] {
            let config = VideoConfig {
                method,
                ..Default::default()
            };
            match policy_for(&config) {
                Err(CoreError::UnsupportedSelection(name)) => assert_eq!(name, method.as_str()),
                _ => panic!("{method} must not produce a policy"),
            }
        }
    }

    #[test]
    fn test_policy_for_implemented_methods() {
        let config = VideoConfig::default();
        assert_eq!(policy_for(&config).unwrap().name(), "interval");

        let config = VideoConfig {
            method: SelectionMethod::All,
            ..Default::default()
        };
        assert_eq!(policy_for(&config).unwrap().name(), "all");
    }
}
