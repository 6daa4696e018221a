//! Core library for extracting high-quality still frames from video.
//!
//! Frames are sampled from a [`FrameSource`] by a selection policy, scored
//! for quality and blur, optionally checked for corner watermarks, optionally
//! cleaned up by post-processing filters, and the frames that pass both gates
//! are written to an output directory.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use framegrab_core::{FfmpegFrameSource, FrameProcessor, VideoConfigBuilder};
//! use std::path::Path;
//!
//! let config = VideoConfigBuilder::new()
//!     .quality_threshold(20.0)
//!     .interval_seconds(2.0)
//!     .build()
//!     .unwrap();
//!
//! let source = FfmpegFrameSource::open(Path::new("/path/to/video.mp4")).unwrap();
//! let summary = FrameProcessor::new(config)
//!     .unwrap()
//!     .run(&source, Path::new("/path/to/screenshots"))
//!     .unwrap();
//!
//! println!("saved {} of {} frames", summary.saved_frames, summary.processed_frames);
//! ```

pub mod analysis;
pub mod config;
pub mod download;
pub mod error;
pub mod external;
pub mod filters;
pub mod output;
pub mod preprocess;
pub mod processing;
pub mod progress;
pub mod selection;
pub mod source;
pub mod temp_files;
pub mod thumbnail;
pub mod utils;

// Re-exports for public API
pub use analysis::{FrameScores, QualityMetrics, detect_watermark, score_frame};
pub use config::{SelectionMethod, VideoConfig, VideoConfigBuilder};
pub use download::{Downloader, YtDlpDownloader, is_remote_source};
pub use error::{CoreError, CoreResult};
pub use filters::{FilterPipeline, FilterStage, FilterTool};
pub use output::{OutputWriter, frame_file_name};
pub use preprocess::{FramePreprocessor, GpuBrightness, GpuContext, PassThrough};
pub use processing::{FrameProcessor, FrameRecord, RunSummary, is_accepted};
pub use progress::{ProgressReporter, ProgressState, ProgressTracker, UnitOutcome};
pub use selection::{SelectionPolicy, policy_for};
pub use source::{FfmpegFrameSource, FrameSource, InMemoryFrameSource};
pub use thumbnail::generate_thumbnail;
pub use utils::format_duration;
