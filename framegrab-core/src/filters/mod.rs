// ============================================================================
// framegrab-core/src/filters/mod.rs
// ============================================================================
//
// POST-PROCESSING FILTERS: Cleanup applied to accepted frames
//
// Accepted frames can be passed through up to three cleanup stages, always in
// the order gradfun, deblock, deband. Deblocking is a non-local means denoise
// computed in-process. Gradfun and deband are delegated to an external ffmpeg
// binary: the frame is written to a scratch PNG, filtered with `-vf`, and read
// back.
//
// KEY COMPONENTS:
// - FilterStage: The three cleanup stages and their ffmpeg filter strings
// - FilterTool: Trait for running an external single-image filter
// - FfmpegFilterTool: ffmpeg-sidecar implementation of FilterTool
// - FilterPipeline: Ordered stages with graceful degradation
//
// ERROR HANDLING:
// A failing stage never fails the frame. The error is logged and the frame
// continues through the remaining stages unfiltered by that stage. Scratch
// files live in a TempDir and are removed on every exit path.

pub mod denoise;

pub use denoise::{NlmParams, denoise};

use crate::config::VideoConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, SidecarSpawner, run_to_completion};
use crate::temp_files::create_temp_dir;

use ffmpeg_sidecar::command::FfmpegCommand;
use image::{ImageFormat, RgbImage};
use std::fmt;
use std::path::{Path, PathBuf};

/// Gradient smoothing passed to ffmpeg's `gradfun`.
pub const GRADFUN_FILTER: &str = "gradfun=1.2:8";
/// ffmpeg's `deband` with default settings.
pub const DEBAND_FILTER: &str = "deband";

// ============================================================================
// STAGES
// ============================================================================

/// One cleanup stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Gradfun,
    Deblock,
    Deband,
}

impl FilterStage {
    pub fn name(&self) -> &'static str {
        match self {
            FilterStage::Gradfun => "gradfun",
            FilterStage::Deblock => "deblock",
            FilterStage::Deband => "deband",
        }
    }

    /// Short description used in run summaries.
    pub fn description(&self) -> &'static str {
        match self {
            FilterStage::Gradfun | FilterStage::Deband => "reduces color banding",
            FilterStage::Deblock => "reduces compression artifacts",
        }
    }

    /// The `-vf` expression for stages that run in the external tool.
    pub fn external_filter(&self) -> Option<&'static str> {
        match self {
            FilterStage::Gradfun => Some(GRADFUN_FILTER),
            FilterStage::Deband => Some(DEBAND_FILTER),
            FilterStage::Deblock => None,
        }
    }

    /// Enabled stages in application order.
    pub fn enabled(config: &VideoConfig) -> Vec<FilterStage> {
        [
            (config.gradfun, FilterStage::Gradfun),
            (config.deblock, FilterStage::Deblock),
            (config.deband, FilterStage::Deband),
        ]
        .into_iter()
        .filter_map(|(on, stage)| on.then_some(stage))
        .collect()
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// EXTERNAL TOOL
// ============================================================================

/// Runs a single-image filter through an external program.
pub trait FilterTool: Send + Sync {
    /// Reads `input`, applies `filter`, writes `output`.
    fn apply(&self, input: &Path, filter: &str, output: &Path) -> CoreResult<()>;
}

/// [`FilterTool`] that shells out to an ffmpeg binary.
pub struct FfmpegFilterTool<S: FfmpegSpawner = SidecarSpawner> {
    program: PathBuf,
    spawner: S,
}

impl FfmpegFilterTool<SidecarSpawner> {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_spawner(program, SidecarSpawner)
    }
}

impl<S: FfmpegSpawner> FfmpegFilterTool<S> {
    pub fn with_spawner(program: impl Into<PathBuf>, spawner: S) -> Self {
        Self {
            program: program.into(),
            spawner,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl<S: FfmpegSpawner> FilterTool for FfmpegFilterTool<S> {
    fn apply(&self, input: &Path, filter: &str, output: &Path) -> CoreResult<()> {
        let mut cmd = FfmpegCommand::new_with_path(&self.program);
        cmd.input(input.as_os_str());
        cmd.args(["-vf", filter]);
        cmd.overwrite();
        cmd.output(output.as_os_str());

        run_to_completion(&self.spawner, cmd, filter)
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Ordered cleanup stages applied to accepted frames.
pub struct FilterPipeline {
    stages: Vec<FilterStage>,
    tool: Box<dyn FilterTool>,
    nlm: NlmParams,
}

impl FilterPipeline {
    /// Pipeline for the stages enabled in `config`, using `config.filter_tool`.
    pub fn from_config(config: &VideoConfig) -> Self {
        Self::with_tool(
            FilterStage::enabled(config),
            Box::new(FfmpegFilterTool::new(config.filter_tool.clone())),
        )
    }

    pub fn with_tool(stages: Vec<FilterStage>, tool: Box<dyn FilterTool>) -> Self {
        Self {
            stages,
            tool,
            nlm: NlmParams::default(),
        }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage over `frame`. Never fails.
    pub fn apply(&self, frame: RgbImage) -> RgbImage {
        self.stages.iter().fold(frame, |frame, stage| {
            match self.apply_stage(*stage, &frame) {
                Ok(filtered) => filtered,
                Err(e) => {
                    log::error!("{} filter failed, keeping unfiltered frame: {}", stage, e);
                    frame
                }
            }
        })
    }

    fn apply_stage(&self, stage: FilterStage, frame: &RgbImage) -> CoreResult<RgbImage> {
        match stage.external_filter() {
            Some(filter) => self.run_external(stage, filter, frame),
            None => Ok(denoise(frame, &self.nlm)),
        }
    }

    fn run_external(&self, stage: FilterStage, filter: &str, frame: &RgbImage) -> CoreResult<RgbImage> {
        let scratch = create_temp_dir("framegrab_filter")?;
        let input = scratch.path().join("input.png");
        let output = scratch.path().join("output.png");

        frame.save_with_format(&input, ImageFormat::Png)?;
        self.tool.apply(&input, filter, &output)?;

        let filtered = image::open(&output)
            .map_err(|e| CoreError::Filter {
                filter: stage.name().to_string(),
                reason: format!("unreadable output: {e}"),
            })?
            .into_rgb8();

        if filtered.dimensions() != frame.dimensions() {
            return Err(CoreError::Filter {
                filter: stage.name().to_string(),
                reason: format!(
                    "output is {}x{}, expected {}x{}",
                    filtered.width(),
                    filtered.height(),
                    frame.width(),
                    frame.height()
                ),
            });
        }
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::MockFfmpegSpawner;
    use image::Rgb;
    use std::sync::Mutex;

    /// Inverts the image and records the paths it was handed.
    #[derive(Default)]
    struct InvertTool {
        seen: Mutex<Vec<(PathBuf, String, PathBuf)>>,
    }

    impl FilterTool for InvertTool {
        fn apply(&self, input: &Path, filter: &str, output: &Path) -> CoreResult<()> {
            self.seen
                .lock()
                .unwrap()
                .push((input.to_path_buf(), filter.to_string(), output.to_path_buf()));
            let mut img = image::open(input)?.into_rgb8();
            image::imageops::invert(&mut img);
            img.save_with_format(output, ImageFormat::Png)?;
            Ok(())
        }
    }

    struct SilentTool;

    impl FilterTool for SilentTool {
        fn apply(&self, _input: &Path, _filter: &str, _output: &Path) -> CoreResult<()> {
            Ok(())
        }
    }

    fn sample_frame() -> RgbImage {
        RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 90]))
    }

    #[test]
    fn test_stage_order_follows_config() {
        let config = VideoConfig {
            deband: true,
            gradfun: true,
            deblock: true,
            ..Default::default()
        };
        assert_eq!(
            FilterStage::enabled(&config),
            vec![FilterStage::Gradfun, FilterStage::Deblock, FilterStage::Deband]
        );
        assert!(FilterStage::enabled(&VideoConfig::default()).is_empty());
    }

    #[test]
    fn test_external_stages_use_fixed_filters() {
        let tool = std::sync::Arc::new(InvertTool::default());
        struct Shared(std::sync::Arc<InvertTool>);
        impl FilterTool for Shared {
            fn apply(&self, input: &Path, filter: &str, output: &Path) -> CoreResult<()> {
                self.0.apply(input, filter, output)
            }
        }

        let pipeline = FilterPipeline::with_tool(
            vec![FilterStage::Gradfun, FilterStage::Deband],
            Box::new(Shared(tool.clone())),
        );
        let frame = sample_frame();
        // Two inversions cancel out.
        assert_eq!(pipeline.apply(frame.clone()), frame);

        let seen = tool.seen.lock().unwrap();
        let filters: Vec<&str> = seen.iter().map(|(_, f, _)| f.as_str()).collect();
        assert_eq!(filters, vec!["gradfun=1.2:8", "deband"]);
        // Scratch files are gone once the stage returns.
        for (input, _, output) in seen.iter() {
            assert!(!input.exists());
            assert!(!output.exists());
        }
    }

    /// Records error-level log lines per thread so a test only sees its own.
    struct ErrorLog {
        lines: Mutex<Vec<(std::thread::ThreadId, String)>>,
    }

    impl log::Log for ErrorLog {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Error
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.lines
                    .lock()
                    .unwrap()
                    .push((std::thread::current().id(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static ERROR_LOG: ErrorLog = ErrorLog {
        lines: Mutex::new(Vec::new()),
    };

    fn errors_logged_here() -> Vec<String> {
        let me = std::thread::current().id();
        ERROR_LOG
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == me)
            .map(|(_, line)| line.clone())
            .collect()
    }

    #[test]
    fn test_broken_tool_path_returns_original_frame() {
        if log::set_logger(&ERROR_LOG).is_ok() {
            log::set_max_level(log::LevelFilter::Error);
        }

        let pipeline = FilterPipeline::with_tool(
            vec![FilterStage::Gradfun, FilterStage::Deband],
            Box::new(FfmpegFilterTool::new("/nonexistent/bin/ffmpeg")),
        );
        let frame = sample_frame();
        assert_eq!(pipeline.apply(frame.clone()), frame);

        let errors = errors_logged_here();
        assert!(
            errors.iter().any(|l| l.starts_with("gradfun filter failed")),
            "{errors:?}"
        );
        assert!(
            errors.iter().any(|l| l.starts_with("deband filter failed")),
            "{errors:?}"
        );
    }

    #[test]
    fn test_ffmpeg_tool_round_trip() {
        let tool = FfmpegFilterTool::with_spawner("/opt/ffmpeg/bin/ffmpeg", MockFfmpegSpawner::copying());
        let pipeline = FilterPipeline::with_tool(vec![FilterStage::Gradfun], Box::new(tool));
        let frame = sample_frame();
        // The mock copies input to output, so the frame survives the round-trip.
        assert_eq!(pipeline.apply(frame.clone()), frame);
    }

    #[test]
    fn test_ffmpeg_tool_args_and_exit_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        sample_frame().save_with_format(&input, ImageFormat::Png).unwrap();

        let tool = FfmpegFilterTool::with_spawner("ffmpeg", MockFfmpegSpawner::copying());
        tool.apply(&input, GRADFUN_FILTER, &output).unwrap();
        let calls = tool.spawner.get_received_calls();
        assert_eq!(calls.len(), 1);
        let args = &calls[0];
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "gradfun=1.2:8");
        assert!(args.contains(&"-y".to_string()));
        assert_eq!(args.last().unwrap(), &output.to_string_lossy());

        let failing = FfmpegFilterTool::with_spawner("ffmpeg", MockFfmpegSpawner::exiting_with(1, "No such filter"));
        match failing.apply(&input, DEBAND_FILTER, &output) {
            Err(CoreError::CommandFailed { stderr, .. }) => assert!(stderr.contains("No such filter")),
            other => panic!("unexpected result: {other:?}"),
        }

        let missing = FfmpegFilterTool::with_spawner("ffmpeg", MockFfmpegSpawner::missing_binary());
        assert!(matches!(
            missing.apply(&input, DEBAND_FILTER, &output),
            Err(CoreError::CommandStart { .. })
        ));
    }

    #[test]
    fn test_missing_output_keeps_frame() {
        let pipeline = FilterPipeline::with_tool(vec![FilterStage::Deband], Box::new(SilentTool));
        let frame = sample_frame();
        assert_eq!(pipeline.apply(frame.clone()), frame);
    }

    #[test]
    fn test_deblock_runs_in_process() {
        let pipeline = FilterPipeline::with_tool(vec![FilterStage::Deblock], Box::new(SilentTool));
        let frame = RgbImage::from_pixel(10, 10, Rgb([50, 60, 70]));
        assert_eq!(pipeline.apply(frame.clone()), frame);
    }
}
