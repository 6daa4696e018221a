//! FFprobe integration for container inspection
//!
//! This module runs ffprobe (through the `ffprobe` crate) to read the frame
//! rate, frame count and dimensions of the first video stream.
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Properties of the first video stream in a container.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStreamInfo {
    pub width: u32,
    pub height: u32,
    /// Frames per second
    pub frame_rate: f64,
    /// Number of frames, from `nb_frames` or estimated from the duration
    pub total_frames: u64,
    pub duration_secs: Option<f64>,
}

/// Probes the first video stream of `input_path`.
pub fn probe_video_stream(input_path: &Path) -> CoreResult<VideoStreamInfo> {
    log::debug!(
        "Running ffprobe (via crate) for video stream info on: {}",
        input_path.display()
    );

    let metadata = ffprobe(input_path).map_err(|err| {
        log::error!(
            "ffprobe failed for video stream on {}: {:?}",
            input_path.display(),
            err
        );
        map_ffprobe_error(err, "video stream")
    })?;

    let video_stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::FfprobeParse(format!(
                "No video stream found in {}",
                input_path.display()
            ))
        })?;

    let (width, height) = match (video_stream.width, video_stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
        (w, h) => {
            return Err(CoreError::FfprobeParse(format!(
                "Invalid dimensions in {}: width={:?}, height={:?}",
                input_path.display(),
                w,
                h
            )));
        }
    };

    let frame_rate = parse_frame_rate(&video_stream.avg_frame_rate)
        .filter(|fps| *fps > 0.0)
        .or_else(|| parse_frame_rate(&video_stream.r_frame_rate).filter(|fps| *fps > 0.0))
        .ok_or_else(|| {
            CoreError::FfprobeParse(format!(
                "Could not determine frame rate for {} (avg={}, r={})",
                input_path.display(),
                video_stream.avg_frame_rate,
                video_stream.r_frame_rate
            ))
        })?;

    let duration_secs = video_stream
        .duration
        .as_deref()
        .or(metadata.format.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());

    let total_frames = video_stream
        .nb_frames
        .as_deref()
        .and_then(|f| f.parse::<u64>().ok())
        .filter(|frames| *frames > 0)
        .or_else(|| duration_secs.map(|secs| (secs * frame_rate).floor() as u64))
        .unwrap_or(0);

    Ok(VideoStreamInfo {
        width,
        height,
        frame_rate,
        total_frames,
        duration_secs,
    })
}

/// Parses an ffprobe rate string such as `30000/1001` or `25`.
pub fn parse_frame_rate(frame_rate_str: &str) -> Option<f64> {
    let frame_rate_str = frame_rate_str.trim();
    if let Some((num, den)) = frame_rate_str.split_once('/') {
        let numerator: f64 = num.trim().parse().ok()?;
        let denominator: f64 = den.trim().parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }
    frame_rate_str.parse().ok()
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => CoreError::FfprobeParse(format!(
            "ffprobe {context} output deserialization: {err}"
        )),
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error during {context}: {err:?}")),
    }
}
