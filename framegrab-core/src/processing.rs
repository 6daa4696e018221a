// ============================================================================
// framegrab-core/src/processing.rs
// ============================================================================
//
// FRAME PROCESSING: Orchestration of per-frame units
//
// A run selects frame ordinals, then treats each ordinal as an independent
// unit: read -> preprocess -> score -> watermark check -> accept/reject ->
// filter (accepted only) -> write (accepted only) -> progress update.
//
// Units run either sequentially in ascending ordinal order or on a bounded
// rayon thread pool. The per-unit work is the same pure function of the
// decoded pixels in both modes, so both produce the same set of saved frames;
// only the completion order differs.
//
// KEY COMPONENTS:
// - FrameRecord: Outcome of one unit
// - is_accepted: The quality and blur gate
// - FrameProcessor: Configured pipeline that runs a FrameSource to completion
// - RunSummary: Counters, elapsed time and saved paths of a run
//
// ERROR HANDLING:
// Only invalid configuration, an unsupported selection method and failing to
// create the output directory abort a run. Everything inside a unit is logged
// and turned into a skip.

use crate::analysis::{FrameScores, detect_watermark, score_frame};
use crate::config::VideoConfig;
use crate::error::{CoreError, CoreResult};
use crate::filters::FilterPipeline;
use crate::output::OutputWriter;
use crate::preprocess::{FramePreprocessor, preprocessor_for};
use crate::progress::{NullProgressReporter, ProgressReporter, ProgressTracker, UnitOutcome};
use crate::selection::policy_for;
use crate::source::FrameSource;

use image::RgbImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// RECORDS AND SUMMARY
// ============================================================================

/// Outcome of processing one sampled ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub ordinal: u64,
    pub scores: FrameScores,
    /// Always false when watermark detection is disabled.
    pub watermark_detected: bool,
    /// True when the frame passed both gates and was written.
    pub accepted: bool,
    /// Set exactly when `accepted` is true.
    pub output_path: Option<PathBuf>,
}

/// Quality and blur gates; both must pass.
pub fn is_accepted(scores: &FrameScores, config: &VideoConfig) -> bool {
    scores.quality >= config.quality_threshold && scores.blur >= config.blur_threshold
}

/// Totals for one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Ordinals chosen by the selection policy.
    pub sampled_frames: u64,
    pub processed_frames: u64,
    pub skipped_frames: u64,
    pub saved_frames: u64,
    pub elapsed: Duration,
    /// Written frames in ordinal order.
    pub saved_paths: Vec<PathBuf>,
}

impl RunSummary {
    /// Processing rate over the whole run.
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed_frames as f64 / secs
        } else {
            0.0
        }
    }
}

// ============================================================================
// PROCESSOR
// ============================================================================

/// Runs the per-frame pipeline over a [`FrameSource`].
pub struct FrameProcessor {
    config: VideoConfig,
    preprocessor: Box<dyn FramePreprocessor>,
    filters: FilterPipeline,
    reporter: Arc<dyn ProgressReporter>,
}

impl FrameProcessor {
    /// Validates `config` and wires the default preprocessor and filters.
    pub fn new(config: VideoConfig) -> CoreResult<Self> {
        config.validate()?;
        let preprocessor = preprocessor_for(&config);
        let filters = FilterPipeline::from_config(&config);
        Ok(Self {
            config,
            preprocessor,
            filters,
            reporter: Arc::new(NullProgressReporter),
        })
    }

    pub fn with_preprocessor(mut self, preprocessor: Box<dyn FramePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_filters(mut self, filters: FilterPipeline) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterPipeline {
        &self.filters
    }

    /// Number of ordinals a run over `source` will evaluate.
    pub fn planned_frames(&self, source: &dyn FrameSource) -> CoreResult<u64> {
        let policy = policy_for(&self.config)?;
        Ok(policy.select(source.total_frames(), source.frame_rate()).len() as u64)
    }

    /// Processes every selected frame of `source`, writing accepted frames to `output_dir`.
    pub fn run(&self, source: &dyn FrameSource, output_dir: &Path) -> CoreResult<RunSummary> {
        let start = Instant::now();
        let policy = policy_for(&self.config)?;
        let ordinals = policy.select(source.total_frames(), source.frame_rate());

        std::fs::create_dir_all(output_dir)?;
        let writer = OutputWriter::new(output_dir, self.config.use_png);
        let tracker = ProgressTracker::for_output_dir(output_dir, self.config.resume);

        log::info!(
            "Selected {} of {} frames ({} selection)",
            ordinals.len(),
            source.total_frames(),
            policy.name()
        );

        let records: Vec<FrameRecord> = if self.config.use_parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.worker_threads.unwrap_or(0))
                .thread_name(|i| format!("framegrab-worker-{i}"))
                .build()
                .map_err(|e| {
                    CoreError::OperationFailed(format!("Failed to initialize thread pool: {e}"))
                })?;
            log::debug!("Processing on {} worker threads", pool.current_num_threads());

            pool.install(|| {
                ordinals
                    .par_iter()
                    .filter_map(|&ordinal| self.process_unit(source, ordinal, &writer, &tracker))
                    .collect()
            })
        } else {
            ordinals
                .iter()
                .filter_map(|&ordinal| self.process_unit(source, ordinal, &writer, &tracker))
                .collect()
        };

        let state = tracker.snapshot();
        let mut saved_paths: Vec<PathBuf> =
            records.into_iter().filter_map(|r| r.output_path).collect();
        saved_paths.sort();

        Ok(RunSummary {
            sampled_frames: ordinals.len() as u64,
            processed_frames: state.processed_frames,
            skipped_frames: state.skipped_frames,
            saved_frames: state.saved_frames,
            elapsed: start.elapsed(),
            saved_paths,
        })
    }

    /// One unit of work. `None` when the ordinal could not be read.
    fn process_unit(
        &self,
        source: &dyn FrameSource,
        ordinal: u64,
        writer: &OutputWriter,
        tracker: &ProgressTracker,
    ) -> Option<FrameRecord> {
        let frame = match source.read_at(ordinal) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::warn!("Could not read frame {}, skipping", ordinal);
                self.reporter.on_unit_unreadable(ordinal);
                return None;
            }
            Err(e) => {
                log::warn!("Could not read frame {}: {}", ordinal, e);
                self.reporter.on_unit_unreadable(ordinal);
                return None;
            }
        };

        let frame = self.preprocessor.prepare(frame);
        let record = self.evaluate(ordinal, frame, writer);

        let outcome = if record.accepted {
            UnitOutcome::Saved
        } else {
            UnitOutcome::Skipped
        };
        let state = tracker.record(outcome);
        self.reporter.on_unit_complete(ordinal, outcome, state);

        Some(record)
    }

    /// Scores, gates, filters and writes one decoded frame.
    pub fn evaluate(&self, ordinal: u64, frame: RgbImage, writer: &OutputWriter) -> FrameRecord {
        let scores = score_frame(&frame);
        let watermark_detected = self.config.detect_watermarks
            && detect_watermark(&frame, self.config.watermark_threshold);

        let mut record = FrameRecord {
            ordinal,
            scores,
            watermark_detected,
            accepted: false,
            output_path: None,
        };

        if !is_accepted(&scores, &self.config) {
            log::debug!(
                "Skipped frame {} (quality {:.1}, blur {:.1})",
                ordinal,
                scores.quality,
                scores.blur
            );
            return record;
        }

        let frame = if self.filters.is_empty() {
            frame
        } else {
            self.filters.apply(frame)
        };

        match writer.write(&frame, ordinal, &scores, watermark_detected) {
            Ok(path) => {
                log::debug!(
                    "Saved frame {} (quality {:.1}, blur {:.1}{})",
                    ordinal,
                    scores.quality,
                    scores.blur,
                    if watermark_detected { ", watermarked" } else { "" }
                );
                record.accepted = true;
                record.output_path = Some(path);
            }
            Err(e) => {
                log::error!("Failed to save frame {}: {}", ordinal, e);
            }
        }
        record
    }
}
