// ============================================================================
// framegrab-cli/src/config.rs
// ============================================================================
//
// CLI CONFIGURATION: JSON config file and flag merging
//
// A run's settings come from three places. An explicitly set value flag wins,
// otherwise the config file value is used, otherwise the core default. Boolean
// switches are on when set on the command line or true in the file.
//
// KEY COMPONENTS:
// - FileConfig: all-optional mirror of the JSON config file
// - RunOptions: merged settings for one CLI run
// - resolve_options: applies the merge rule and validates the result

// ---- Internal crate imports ----
use crate::cli::Cli;
use crate::error::{CliErrorContext, CliResult};

// ---- External crate imports ----
use framegrab_core::{SelectionMethod, VideoConfig, VideoConfigBuilder};
use serde::Deserialize;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};

// ============================================================================
// CONFIG FILE
// ============================================================================

/// Keys accepted in the `--config` JSON file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub quality: Option<f64>,
    pub interval: Option<f64>,
    pub blur: Option<f64>,
    pub detect_watermarks: Option<bool>,
    pub watermark_threshold: Option<f64>,
    pub max_resolution: Option<u32>,
    pub output: Option<PathBuf>,
    pub png: Option<bool>,
    pub disable_parallel: Option<bool>,
    pub use_gpu: Option<bool>,
    pub resume: Option<bool>,
    pub thumbnail: Option<bool>,
    pub verbose: Option<bool>,
    pub gradfun: Option<bool>,
    pub deblock: Option<bool>,
    pub deband: Option<bool>,
    pub method: Option<String>,
    pub jobs: Option<usize>,
}

/// Reads and parses a JSON config file.
pub fn load_file_config(path: &Path) -> CliResult<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .cli_with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&contents)
        .cli_with_context(|| format!("Failed to parse config file {}", path.display()))
}

// ============================================================================
// MERGED OPTIONS
// ============================================================================

/// Everything one run needs: the core config plus CLI-only settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub video: VideoConfig,
    pub output: Option<PathBuf>,
    pub thumbnail: bool,
}

fn switch(flag: bool, file: Option<bool>) -> bool {
    flag || file.unwrap_or(false)
}

/// Merges `cli` over `file` and validates the resulting configuration.
pub fn resolve_options(cli: &Cli, file: &FileConfig) -> CliResult<RunOptions> {
    let mut builder = VideoConfigBuilder::new();

    if let Some(quality) = cli.quality.or(file.quality) {
        builder = builder.quality_threshold(quality);
    }
    if let Some(blur) = cli.blur.or(file.blur) {
        builder = builder.blur_threshold(blur);
    }
    if let Some(threshold) = cli.watermark_threshold.or(file.watermark_threshold) {
        builder = builder.watermark_threshold(threshold);
    }
    if let Some(interval) = cli.interval.or(file.interval) {
        builder = builder.interval_seconds(interval);
    }
    if let Some(method) = cli.method.as_deref().or(file.method.as_deref()) {
        builder = builder.method(method.parse::<SelectionMethod>()?);
    }

    let video = builder
        .max_resolution(cli.max_resolution.or(file.max_resolution))
        .worker_threads(cli.jobs.or(file.jobs))
        .detect_watermarks(switch(cli.detect_watermarks, file.detect_watermarks))
        .use_parallel(!switch(cli.disable_parallel, file.disable_parallel))
        .use_png(switch(cli.png, file.png))
        .use_gpu(switch(cli.use_gpu, file.use_gpu))
        .gradfun(switch(cli.gradfun, file.gradfun))
        .deblock(switch(cli.deblock, file.deblock))
        .deband(switch(cli.deband, file.deband))
        .resume(switch(cli.resume, file.resume))
        .verbose(switch(cli.verbose, file.verbose))
        .build()?;

    Ok(RunOptions {
        video,
        output: cli.output.clone().or_else(|| file.output.clone()),
        thumbnail: switch(cli.thumbnail, file.thumbnail),
    })
}
