// ============================================================================
// framegrab-cli/src/commands/extract.rs
// ============================================================================
//
// EXTRACT COMMAND: the end-to-end screenshot run
//
// Resolves settings, fetches the video when the source is a URL, runs the
// frame processor, optionally builds a thumbnail montage and prints a summary.
// A downloaded video is removed when the run ends, successful or not.

// ---- Internal crate imports ----
use crate::cli::Cli;
use crate::config::{FileConfig, RunOptions, load_file_config, resolve_options};
use crate::error::CliResult;
use crate::logging::{get_timestamp, init_logging};
use crate::progress::CliProgressReporter;

// ---- External crate imports ----
use console::style;
use framegrab_core::download::sanitize_title;
use framegrab_core::utils::{default_output_dir_name, video_title_from_path};
use framegrab_core::{
    Downloader, FfmpegFrameSource, FilterStage, FrameProcessor, RunSummary, YtDlpDownloader,
    format_duration, generate_thumbnail, is_remote_source,
};
use log::{info, warn};

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::sync::Arc;

const RULE: &str = "========================================";

// ============================================================================
// DOWNLOADED FILE CLEANUP
// ============================================================================

/// Removes a downloaded video when dropped.
struct DownloadedVideo {
    path: PathBuf,
}

impl Drop for DownloadedVideo {
    fn drop(&mut self) {
        if self.path.exists() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => info!("Removed downloaded video {}", self.path.display()),
                Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
            }
        }
    }
}

/// Local path and title of the video to process.
struct ResolvedSource {
    path: PathBuf,
    title: String,
    _download: Option<DownloadedVideo>,
}

fn resolve_source(
    source: &str,
    timestamp: &str,
    downloader: &dyn Downloader,
) -> CliResult<ResolvedSource> {
    if !is_remote_source(source) {
        let path = PathBuf::from(source);
        let title = sanitize_title(&video_title_from_path(&path));
        return Ok(ResolvedSource {
            path,
            title,
            _download: None,
        });
    }

    let path = PathBuf::from(format!("downloaded_video_{timestamp}.mp4"));
    // Guard first so a partial download is removed on failure too.
    let guard = DownloadedVideo { path: path.clone() };
    let title = sanitize_title(&downloader.download(source, &path)?);
    Ok(ResolvedSource {
        path,
        title,
        _download: Some(guard),
    })
}

// ============================================================================
// RUN
// ============================================================================

/// Runs one extraction for the parsed command line.
pub fn run_extract(cli: Cli) -> CliResult<()> {
    let file = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let opts = resolve_options(&cli, &file)?;
    init_logging(opts.video.verbose);

    let timestamp = get_timestamp();
    let downloader = YtDlpDownloader::new(opts.video.max_resolution).verbose(opts.video.verbose);
    let source = resolve_source(&cli.source, &timestamp, &downloader)?;

    let output_dir = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_dir_name(&source.title, &timestamp)));

    info!("{}", RULE);
    info!("Framegrab Run Started: {}", chrono::Local::now());
    info!("Source: {}", cli.source);
    info!("Output directory: {}", output_dir.display());
    info!(
        "Method: {} | quality >= {} | blur >= {}",
        opts.video.method, opts.video.quality_threshold, opts.video.blur_threshold
    );
    info!("{}", RULE);

    let summary = extract_frames(&source.path, &output_dir, &opts)?;

    if opts.thumbnail {
        match generate_thumbnail(&output_dir) {
            Ok(Some(path)) => info!("Thumbnail montage: {}", path.display()),
            Ok(None) => {}
            Err(e) => warn!("Failed to create thumbnail montage: {}", e),
        }
    }

    print_summary(&summary, &opts, &output_dir);
    Ok(())
}

fn extract_frames(video: &Path, output_dir: &Path, opts: &RunOptions) -> CliResult<RunSummary> {
    let frame_source = FfmpegFrameSource::open(video)?;
    let processor = FrameProcessor::new(opts.video.clone())?;

    let planned = processor.planned_frames(&frame_source)?;
    let reporter = Arc::new(CliProgressReporter::new(planned, opts.video.verbose));
    let processor = processor.with_reporter(reporter.clone());

    let result = processor.run(&frame_source, output_dir);
    reporter.finish();
    result
}

fn print_summary(summary: &RunSummary, opts: &RunOptions, output_dir: &Path) {
    info!("{}", RULE);
    info!("{}", style("Extraction Summary").bold());
    info!("{}", RULE);
    info!(
        "Execution time: {}",
        format_duration(summary.elapsed.as_secs_f64())
    );
    info!("Frames processed: {}", summary.processed_frames);
    info!(
        "Frames saved: {}",
        style(summary.saved_frames).green().bold()
    );
    info!("Frames skipped: {}", style(summary.skipped_frames).yellow());
    info!("Processing speed: {:.2} frames/s", summary.frames_per_second());

    let stages = FilterStage::enabled(&opts.video);
    if stages.is_empty() {
        info!("Post-processing filters: none");
    } else {
        info!("Post-processing filters applied:");
        for stage in stages {
            info!("  - {} ({})", style(stage).cyan(), stage.description());
        }
    }

    info!("Screenshots saved to {}", output_dir.display());
    info!("Framegrab Run Finished: {}", chrono::Local::now());
    info!("{}", RULE);
}
