// framegrab-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::Parser;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Framegrab: extract high-quality screenshots from videos",
    long_about = "Samples frames from a local video or a downloaded URL, scores them for \
                  quality and sharpness, and saves the frames that pass both thresholds."
)]
pub struct Cli {
    /// Path to a local video file, or an http(s):// / www. URL to download
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Optional: JSON config file; explicit flags override its values
    #[arg(long, value_name = "CONFIG_JSON")]
    pub config: Option<PathBuf>,

    /// Optional: Output directory (defaults to screenshots_<title>_<timestamp>)
    #[arg(short = 'o', long, value_name = "OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    // --- Frame Selection ---
    /// Optional: Frame selection method
    #[arg(long, value_name = "METHOD", value_parser = ["interval", "all", "keyframes", "scene"])]
    pub method: Option<String>,

    /// Optional: Seconds between sampled frames for the interval method (default 5)
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<f64>,

    // --- Thresholds ---
    /// Optional: Minimum quality score, 0-100 (default 12)
    #[arg(long, value_name = "SCORE")]
    pub quality: Option<f64>,

    /// Optional: Minimum blur (sharpness) score (default 10)
    #[arg(long, value_name = "SCORE")]
    pub blur: Option<f64>,

    /// Flag frames with a watermark-like shape in a corner
    #[arg(long)]
    pub detect_watermarks: bool,

    /// Optional: Watermark shape threshold, 0-1 (default 0.8)
    #[arg(long, value_name = "THRESHOLD")]
    pub watermark_threshold: Option<f64>,

    // --- Download ---
    /// Optional: Maximum video height to request when downloading
    #[arg(long, value_name = "HEIGHT")]
    pub max_resolution: Option<u32>,

    // --- Output & Processing ---
    /// Save frames as PNG instead of JPEG
    #[arg(long)]
    pub png: bool,

    /// Process frames sequentially
    #[arg(long)]
    pub disable_parallel: bool,

    /// Optional: Worker threads for parallel processing (defaults to all cores)
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Run the brightness preprocessing step on the GPU when one is available
    #[arg(long)]
    pub use_gpu: bool,

    /// Write progress.json to the output directory after every frame
    #[arg(long)]
    pub resume: bool,

    /// Build a 3x3 thumbnail montage from the saved frames
    #[arg(long)]
    pub thumbnail: bool,

    /// Debug logging and a progress bar
    #[arg(short, long)]
    pub verbose: bool,

    // --- Post-processing Filters ---
    /// Apply gradfun to reduce color banding
    #[arg(long)]
    pub gradfun: bool,

    /// Apply non-local means deblocking to reduce compression artifacts
    #[arg(long)]
    pub deblock: bool,

    /// Apply deband to reduce color banding
    #[arg(long)]
    pub deband: bool,
}
