// ============================================================================
// framegrab-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for VideoConfig
//
// This module implements the builder pattern for VideoConfig, providing a
// fluent API that starts from the defaults and validates on build.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{SelectionMethod, VideoConfig};
use crate::error::CoreResult;

/// Builder for creating validated [`VideoConfig`] instances.
///
/// # Examples
///
/// ```rust
/// use framegrab_core::config::VideoConfigBuilder;
///
/// let config = VideoConfigBuilder::new()
///     .quality_threshold(15.0)
///     .blur_threshold(50.0)
///     .use_png(true)
///     .deblock(true)
///     .build()
///     .unwrap();
/// assert!(config.any_filter_enabled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VideoConfigBuilder {
    config: VideoConfig,
}

impl VideoConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: VideoConfig) -> Self {
        Self { config }
    }

    /// Sets the composite quality threshold (0-100).
    pub fn quality_threshold(mut self, threshold: f64) -> Self {
        self.config.quality_threshold = threshold;
        self
    }

    /// Sets the blur threshold.
    pub fn blur_threshold(mut self, threshold: f64) -> Self {
        self.config.blur_threshold = threshold;
        self
    }

    /// Sets the watermark fill-ratio threshold (0-1).
    pub fn watermark_threshold(mut self, threshold: f64) -> Self {
        self.config.watermark_threshold = threshold;
        self
    }

    /// Sets the sampling interval in seconds.
    pub fn interval_seconds(mut self, seconds: f64) -> Self {
        self.config.interval_seconds = seconds;
        self
    }

    /// Sets the frame selection method.
    pub fn method(mut self, method: SelectionMethod) -> Self {
        self.config.method = method;
        self
    }

    /// Sets the maximum download resolution (height).
    pub fn max_resolution(mut self, height: Option<u32>) -> Self {
        self.config.max_resolution = height;
        self
    }

    pub fn detect_watermarks(mut self, enable: bool) -> Self {
        self.config.detect_watermarks = enable;
        self
    }

    pub fn use_parallel(mut self, enable: bool) -> Self {
        self.config.use_parallel = enable;
        self
    }

    /// Sets the worker count for parallel mode.
    pub fn worker_threads(mut self, threads: Option<usize>) -> Self {
        self.config.worker_threads = threads;
        self
    }

    pub fn use_png(mut self, enable: bool) -> Self {
        self.config.use_png = enable;
        self
    }

    pub fn use_gpu(mut self, enable: bool) -> Self {
        self.config.use_gpu = enable;
        self
    }

    pub fn gradfun(mut self, enable: bool) -> Self {
        self.config.gradfun = enable;
        self
    }

    pub fn deblock(mut self, enable: bool) -> Self {
        self.config.deblock = enable;
        self
    }

    pub fn deband(mut self, enable: bool) -> Self {
        self.config.deband = enable;
        self
    }

    /// Sets the binary used for external filters.
    pub fn filter_tool(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.filter_tool = path.into();
        self
    }

    pub fn resume(mut self, enable: bool) -> Self {
        self.config.resume = enable;
        self
    }

    pub fn verbose(mut self, enable: bool) -> Self {
        self.config.verbose = enable;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> CoreResult<VideoConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
