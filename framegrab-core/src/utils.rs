//! Utility functions for formatting and path handling.
//!
//! General-purpose helpers shared by the library and the CLI.

use std::path::Path;

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// File stem of a local video, used as its title. Falls back to "video".
#[must_use]
pub fn video_title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "video".to_string())
}

/// Default output directory name: `screenshots_{title}_{timestamp}`.
#[must_use]
pub fn default_output_dir_name(title: &str, timestamp: &str) -> String {
    format!("screenshots_{title}_{timestamp}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(59.9), "00:00:59");
        assert_eq!(format_duration(3661.0), "01:01:01");
        assert_eq!(format_duration(90061.0), "25:01:01");

        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
        assert_eq!(format_duration(f64::INFINITY), "??:??:??");
    }

    #[test]
    fn test_video_title_from_path() {
        assert_eq!(video_title_from_path(Path::new("/videos/My Clip.mp4")), "My Clip");
        assert_eq!(video_title_from_path(Path::new("clip")), "clip");
        assert_eq!(video_title_from_path(Path::new("/")), "video");
    }

    #[test]
    fn test_default_output_dir_name() {
        assert_eq!(
            default_output_dir_name("clip", "20240101_120000"),
            "screenshots_clip_20240101_120000"
        );
    }
}
