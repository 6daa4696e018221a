// ============================================================================
// framegrab-cli/src/logging.rs
// ============================================================================
//
// LOGGING: env_logger setup and timestamps
//
// The core library logs through the `log` facade; this module installs the
// `env_logger` backend with a timestamped, colour-coded format.
//
// USAGE:
// - default: Info
// - --verbose: Debug (per-frame accept/skip decisions)
// - RUST_LOG overrides both, e.g. RUST_LOG=framegrab_core=trace

use console::style;
use log::LevelFilter;
use std::io::Write;

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            let level_str = match record.level() {
                log::Level::Error => style("ERROR").red().bold(),
                log::Level::Warn => style("WARN ").yellow(),
                log::Level::Info => style("INFO ").green(),
                log::Level::Debug => style("DEBUG").blue(),
                log::Level::Trace => style("TRACE").magenta(),
            };
            writeln!(
                buf,
                "{} {} {}",
                style(buf.timestamp()).dim(),
                level_str,
                record.args()
            )
        })
        .filter(None, level);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // A logger may already be installed, e.g. by a test harness.
    let _ = builder.try_init();
    log::debug!("Logger initialized with level: {}", level);
}

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// Used for download file names and default output directories.
///
/// # Example
/// ```
/// let dir = format!("screenshots_clip_{}", framegrab_cli::logging::get_timestamp());
/// assert!(dir.starts_with("screenshots_clip_"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
