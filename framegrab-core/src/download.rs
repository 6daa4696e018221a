// ============================================================================
// framegrab-core/src/download.rs
// ============================================================================
//
// REMOTE SOURCES: Fetching videos given as URLs
//
// Sources that look like URLs are downloaded to a local mp4 before frame
// extraction. The Downloader trait hides the fetching tool; the default
// implementation drives the `yt-dlp` command line with a resolution-capped
// format selector and a bounded number of attempts.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Attempts made before a download is reported as failed.
pub const DOWNLOAD_ATTEMPTS: u32 = 3;

const REMOTE_PREFIXES: [&str; 3] = ["http://", "https://", "www."];

/// True when `source` should be fetched rather than opened as a local path.
pub fn is_remote_source(source: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|prefix| source.starts_with(prefix))
}

/// yt-dlp format selector, capped at a frame height of `max_resolution` when given.
pub fn format_selector(max_resolution: Option<u32>) -> String {
    match max_resolution {
        Some(height) => {
            format!("bestvideo[height<={height}]+bestaudio/best[height<={height}]")
        }
        None => "bestvideo+bestaudio/best".to_string(),
    }
}

/// Makes a video title safe to embed in a directory name.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned
    }
}

/// Runs `operation` up to `attempts` times, returning the first success.
pub fn with_retries<T, F>(attempts: u32, label: &str, mut operation: F) -> CoreResult<T>
where
    F: FnMut(u32) -> CoreResult<T>,
{
    let attempts = attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < attempts {
                    log::warn!("{} attempt {} failed: {}. Retrying...", label, attempt, e);
                }
                last_error = Some(e);
            }
        }
    }
    Err(CoreError::Download(format!(
        "{} failed after {} attempts: {}",
        label,
        attempts,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Fetches a remote video into a local file.
pub trait Downloader {
    /// Downloads `url` to `output` and returns the video's title.
    fn download(&self, url: &str, output: &Path) -> CoreResult<String>;
}

/// [`Downloader`] backed by the `yt-dlp` command line tool.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: PathBuf,
    max_resolution: Option<u32>,
    verbose: bool,
    attempts: u32,
}

impl YtDlpDownloader {
    pub fn new(max_resolution: Option<u32>) -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            max_resolution,
            verbose: false,
            attempts: DOWNLOAD_ATTEMPTS,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn command(&self, url: &str, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-simulate")
            .args(["--print", "title"])
            .args(["-f", &format_selector(self.max_resolution)])
            .args(["--merge-output-format", "mp4"])
            .arg("-o")
            .arg(output)
            .arg(url)
            .stdin(Stdio::null());
        if self.verbose {
            cmd.arg("--verbose");
        }
        cmd
    }

    fn attempt(&self, url: &str, output: &Path) -> CoreResult<String> {
        let program = self.program.display().to_string();
        let result = self
            .command(url, output)
            .output()
            .map_err(|e| command_start_error(program.clone(), e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(command_failed_error(
                program,
                result.status,
                stderr.trim_end(),
            ));
        }

        let stdout = String::from_utf8_lossy(&result.stdout);
        let title = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("video")
            .to_string();
        Ok(title)
    }
}

impl Downloader for YtDlpDownloader {
    fn download(&self, url: &str, output: &Path) -> CoreResult<String> {
        if let Err(e) = crate::external::check_dependency("ffmpeg") {
            log::warn!("ffmpeg not found, merged downloads may fail: {}", e);
        }
        log::info!("Downloading {} (format {})", url, format_selector(self.max_resolution));

        let title = with_retries(self.attempts, "Download", |_| self.attempt(url, output))?;
        log::info!("Downloaded \"{}\" to {}", title, output.display());
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_remote_detection() {
        assert!(is_remote_source("https://example.com/v.mp4"));
        assert!(is_remote_source("http://example.com/v"));
        assert!(is_remote_source("www.example.com/watch?v=1"));
        assert!(!is_remote_source("/videos/clip.mp4"));
        assert!(!is_remote_source("clip.mp4"));
        assert!(!is_remote_source("ftp://example.com/v.mp4"));
    }

    #[test]
    fn test_format_selector() {
        assert_eq!(
            format_selector(Some(720)),
            "bestvideo[height<=720]+bestaudio/best[height<=720]"
        );
        assert_eq!(format_selector(None), "bestvideo+bestaudio/best");
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("A/B: the movie?"), "A_B_ the movie_");
        assert_eq!(sanitize_title("  "), "video");
        assert_eq!(sanitize_title("plain"), "plain");
    }

    #[test]
    fn test_retries_stop_on_success() {
        let calls = Cell::new(0);
        let result = with_retries(3, "Download", |attempt| {
            calls.set(calls.get() + 1);
            if attempt < 2 {
                Err(CoreError::OperationFailed("flaky".into()))
            } else {
                Ok("title")
            }
        });
        assert_eq!(result.unwrap(), "title");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retries_exhausted() {
        let calls = Cell::new(0);
        let result: CoreResult<()> = with_retries(3, "Download", |_| {
            calls.set(calls.get() + 1);
            Err(CoreError::OperationFailed("offline".into()))
        });
        assert_eq!(calls.get(), 3);
        match result {
            Err(CoreError::Download(msg)) => {
                assert!(msg.contains("3 attempts"));
                assert!(msg.contains("offline"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_tool_fails_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            YtDlpDownloader::new(Some(480)).with_program("/nonexistent/bin/yt-dlp");
        let err = downloader
            .download("https://example.com/v", &dir.path().join("v.mp4"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Download(_)));
    }
}
