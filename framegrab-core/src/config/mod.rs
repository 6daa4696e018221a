//! Configuration structures and constants for the framegrab-core library.
//!
//! [`VideoConfig`] is built once, validated before any frame work starts, and
//! then shared read-only by every worker.

mod builder;

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use builder::VideoConfigBuilder;

// Default constants

/// Default composite quality threshold (0-100).
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 12.0;

/// Default blur threshold (variance of the Laplacian).
pub const DEFAULT_BLUR_THRESHOLD: f64 = 10.0;

/// Default watermark fill-ratio threshold (0-1).
pub const DEFAULT_WATERMARK_THRESHOLD: f64 = 0.8;

/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECONDS: f64 = 5.0;

/// Default external filter tool.
pub const DEFAULT_FILTER_TOOL: &str = "ffmpeg";

/// Name of the progress checkpoint written into the output directory.
pub const PROGRESS_FILE_NAME: &str = "progress.json";

/// How frame ordinals are chosen from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// One frame every `interval_seconds`.
    #[default]
    Interval,
    /// Every decoded frame.
    All,
    /// Reserved: keyframe-only sampling.
    Keyframes,
    /// Reserved: scene-change sampling.
    Scene,
}

impl SelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMethod::Interval => "interval",
            SelectionMethod::All => "all",
            SelectionMethod::Keyframes => "keyframes",
            SelectionMethod::Scene => "scene",
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interval" => Ok(SelectionMethod::Interval),
            "all" => Ok(SelectionMethod::All),
            "keyframes" => Ok(SelectionMethod::Keyframes),
            "scene" => Ok(SelectionMethod::Scene),
            other => Err(CoreError::InvalidConfig(format!(
                "Unknown selection method '{other}' (expected interval, all, keyframes or scene)"
            ))),
        }
    }
}

/// Main configuration structure for a frame extraction run.
///
/// All fields have sensible defaults; [`VideoConfigBuilder`] offers a fluent
/// way to set the ones that matter. Call [`VideoConfig::validate`] (the
/// builder's `build` does) before handing the config to a processor.
///
/// # Examples
///
/// ```rust
/// use framegrab_core::config::{SelectionMethod, VideoConfigBuilder};
///
/// let config = VideoConfigBuilder::new()
///     .quality_threshold(20.0)
///     .interval_seconds(2.5)
///     .method(SelectionMethod::Interval)
///     .detect_watermarks(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.quality_threshold, 20.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    // ---- Acceptance gates ----
    /// Minimum composite quality score (0-100)
    pub quality_threshold: f64,

    /// Minimum variance of the Laplacian
    pub blur_threshold: f64,

    /// Minimum contour fill ratio for a watermark candidate (0-1)
    pub watermark_threshold: f64,

    // ---- Sampling ----
    /// Seconds between sampled frames for the interval method
    pub interval_seconds: f64,

    /// Frame selection method
    pub method: SelectionMethod,

    /// Maximum download height; only consulted by the downloader
    pub max_resolution: Option<u32>,

    // ---- Processing options ----
    pub detect_watermarks: bool,
    pub use_parallel: bool,

    /// Worker count for parallel mode (defaults to the CPU count)
    pub worker_threads: Option<usize>,

    /// Save PNG instead of JPEG
    pub use_png: bool,
    pub use_gpu: bool,

    // ---- Post-accept filters ----
    pub gradfun: bool,
    pub deblock: bool,
    pub deband: bool,

    /// Binary used for the gradfun/deband round-trip
    pub filter_tool: PathBuf,

    // ---- Reporting ----
    /// Write the progress checkpoint after every frame
    pub resume: bool,
    pub verbose: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            blur_threshold: DEFAULT_BLUR_THRESHOLD,
            watermark_threshold: DEFAULT_WATERMARK_THRESHOLD,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            method: SelectionMethod::Interval,
            max_resolution: None,
            detect_watermarks: false,
            use_parallel: true,
            worker_threads: None,
            use_png: false,
            use_gpu: false,
            gradfun: false,
            deblock: false,
            deband: false,
            filter_tool: PathBuf::from(DEFAULT_FILTER_TOOL),
            resume: false,
            verbose: false,
        }
    }
}

impl VideoConfig {
    /// Checks threshold ranges and the sampling interval.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.quality_threshold.is_finite() || !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(CoreError::InvalidConfig(
                "Quality threshold must be between 0 and 100".to_string(),
            ));
        }
        if !self.watermark_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.watermark_threshold)
        {
            return Err(CoreError::InvalidConfig(
                "Watermark threshold must be between 0 and 1".to_string(),
            ));
        }
        if !self.interval_seconds.is_finite() || self.interval_seconds <= 0.0 {
            return Err(CoreError::InvalidConfig(
                "Interval must be greater than 0".to_string(),
            ));
        }
        if !self.blur_threshold.is_finite() || self.blur_threshold < 0.0 {
            return Err(CoreError::InvalidConfig(
                "Blur threshold must be a non-negative number".to_string(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(CoreError::InvalidConfig(
                "Worker thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// True when any post-accept filter is enabled.
    pub fn any_filter_enabled(&self) -> bool {
        self.gradfun || self.deblock || self.deband
    }

    /// Output file extension for saved frames.
    pub fn image_extension(&self) -> &'static str {
        if self.use_png { "png" } else { "jpg" }
    }
}
