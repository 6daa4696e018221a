// ============================================================================
// framegrab-core/src/source.rs
// ============================================================================
//
// FRAME SOURCE: Random access to decoded frames by ordinal
//
// A frame source reports the frame rate and frame count of a video and hands
// out RGB pixel buffers for individual frame ordinals. The ffmpeg-backed
// source seeks to the ordinal's timestamp and decodes a single frame as raw
// RGB24; every read is an independent subprocess, so reads from several
// worker threads never share decoder state.
//
// Opening a source is the one I/O step that may abort a run. Failures while
// reading an individual ordinal are reported as "not found" so the caller can
// skip that frame.

use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegProcess, FfmpegSpawner, SidecarSpawner, VideoStreamInfo, probe_video_stream};

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Random-access provider of decoded frames.
pub trait FrameSource: Sync {
    /// Frames per second of the video stream.
    fn frame_rate(&self) -> f64;

    /// Total number of frames in decode order.
    fn total_frames(&self) -> u64;

    /// Seeks to `ordinal` and decodes it. `Ok(None)` means no frame exists there.
    fn read_at(&self, ordinal: u64) -> CoreResult<Option<RgbImage>>;
}

/// Frame source backed by ffprobe (metadata) and ffmpeg (decoding).
pub struct FfmpegFrameSource<S: FfmpegSpawner = SidecarSpawner> {
    path: PathBuf,
    info: VideoStreamInfo,
    spawner: S,
}

impl FfmpegFrameSource<SidecarSpawner> {
    /// Opens `path` using the real ffmpeg/ffprobe binaries.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_spawner(path, SidecarSpawner)
    }
}

impl<S: FfmpegSpawner> FfmpegFrameSource<S> {
    /// Opens `path`, decoding through the supplied spawner.
    pub fn open_with_spawner(path: &Path, spawner: S) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::InputNotFound(path.display().to_string()));
        }

        let info = probe_video_stream(path).map_err(|e| CoreError::SourceOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        log::info!(
            "Opened {}: {}x{}, {:.3} fps, {} frames",
            path.display(),
            info.width,
            info.height,
            info.frame_rate,
            info.total_frames
        );

        Ok(Self::from_parts(path, info, spawner))
    }

    /// Builds a source from stream properties that were already probed.
    pub fn from_parts(path: impl Into<PathBuf>, info: VideoStreamInfo, spawner: S) -> Self {
        Self {
            path: path.into(),
            info,
            spawner,
        }
    }

    /// Stream properties reported by ffprobe.
    pub fn info(&self) -> &VideoStreamInfo {
        &self.info
    }

    fn decode_one(&self, ordinal: u64) -> CoreResult<Option<RgbImage>> {
        let timestamp = ordinal as f64 / self.info.frame_rate;

        let mut cmd = FfmpegCommand::new();
        cmd.args(["-ss", &format!("{timestamp:.6}")]);
        cmd.input(self.path.as_os_str());
        cmd.args(["-frames:v", "1", "-an", "-sn"]);
        cmd.rawvideo();

        log::trace!("Decoding frame {} at {:.3}s", ordinal, timestamp);

        let mut process = self.spawner.spawn(cmd)?;
        let mut decoded = None;
        let mut errors = Vec::new();
        process.handle_events(|event| {
            match event {
                FfmpegEvent::OutputFrame(frame) if decoded.is_none() => {
                    decoded = Some(frame);
                }
                FfmpegEvent::Error(line) => errors.push(line),
                _ => {}
            }
            Ok(())
        })?;
        process.wait()?;

        let Some(frame) = decoded else {
            if !errors.is_empty() {
                log::debug!("No frame at ordinal {}: {}", ordinal, errors.join("; "));
            }
            return Ok(None);
        };

        RgbImage::from_raw(frame.width, frame.height, frame.data)
            .map(Some)
            .ok_or_else(|| {
                CoreError::Decode(format!(
                    "Frame {} buffer does not match {}x{} RGB24",
                    ordinal, frame.width, frame.height
                ))
            })
    }
}

impl<S: FfmpegSpawner> FrameSource for FfmpegFrameSource<S> {
    fn frame_rate(&self) -> f64 {
        self.info.frame_rate
    }

    fn total_frames(&self) -> u64 {
        self.info.total_frames
    }

    fn read_at(&self, ordinal: u64) -> CoreResult<Option<RgbImage>> {
        if ordinal >= self.info.total_frames {
            return Ok(None);
        }
        match self.decode_one(ordinal) {
            Ok(frame) => Ok(frame),
            Err(e) => {
                log::warn!("Failed to decode frame {}: {}", ordinal, e);
                Ok(None)
            }
        }
    }
}

/// Frame source over frames already held in memory.
///
/// Handy for stills, generated content and tests; ordinals index the vector.
pub struct InMemoryFrameSource {
    frames: Vec<RgbImage>,
    frame_rate: f64,
}

impl InMemoryFrameSource {
    pub fn new(frames: Vec<RgbImage>, frame_rate: f64) -> Self {
        Self { frames, frame_rate }
    }
}

impl FrameSource for InMemoryFrameSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn total_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    fn read_at(&self, ordinal: u64) -> CoreResult<Option<RgbImage>> {
        Ok(usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.frames.get(i))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::MockFfmpegSpawner;
    use ffmpeg_sidecar::event::OutputVideoFrame;

    fn stream_info(total_frames: u64) -> VideoStreamInfo {
        VideoStreamInfo {
            width: 2,
            height: 2,
            frame_rate: 30.0,
            total_frames,
            duration_secs: Some(total_frames as f64 / 30.0),
        }
    }

    fn raw_frame(width: u32, height: u32, value: u8) -> FfmpegEvent {
        FfmpegEvent::OutputFrame(OutputVideoFrame {
            width,
            height,
            pix_fmt: "rgb24".to_string(),
            output_index: 0,
            data: vec![value; (width * height * 3) as usize],
            frame_num: 0,
            timestamp: 0.0,
        })
    }

    #[test]
    fn test_read_at_seeks_and_decodes_one_frame() {
        let spawner = MockFfmpegSpawner::emitting(vec![raw_frame(2, 2, 77), raw_frame(2, 2, 5)]);
        let source = FfmpegFrameSource::from_parts("/v.mp4", stream_info(900), spawner);

        let frame = source.read_at(150).unwrap().expect("frame decoded");
        assert_eq!(frame.dimensions(), (2, 2));
        // Only the first emitted frame is kept.
        assert_eq!(frame.get_pixel(1, 1), &image::Rgb([77, 77, 77]));

        let calls = source.spawner.get_received_calls();
        assert_eq!(calls.len(), 1);
        let args = &calls[0];
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[ss + 1], "5.000000");
        assert!(ss < input, "seek must precede the input");
        assert_eq!(args[input + 1], "/v.mp4");
        assert!(args.windows(2).any(|w| w == ["-frames:v", "1"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "rgb24"]));
    }

    #[test]
    fn test_read_past_end_is_not_found_without_spawning() {
        let spawner = MockFfmpegSpawner::emitting(vec![raw_frame(2, 2, 1)]);
        let source = FfmpegFrameSource::from_parts("/v.mp4", stream_info(900), spawner);

        assert!(source.read_at(900).unwrap().is_none());
        assert!(source.spawner.get_received_calls().is_empty());
    }

    #[test]
    fn test_no_output_frame_is_not_found() {
        let spawner = MockFfmpegSpawner::exiting_with(0, "Output file is empty, nothing was encoded");
        let source = FfmpegFrameSource::from_parts("/v.mp4", stream_info(10), spawner);
        assert!(source.read_at(3).unwrap().is_none());
    }

    #[test]
    fn test_mismatched_buffer_is_not_found() {
        let short = FfmpegEvent::OutputFrame(OutputVideoFrame {
            width: 4,
            height: 4,
            pix_fmt: "rgb24".to_string(),
            output_index: 0,
            data: vec![0; 10],
            frame_num: 0,
            timestamp: 0.0,
        });
        let source =
            FfmpegFrameSource::from_parts("/v.mp4", stream_info(10), MockFfmpegSpawner::emitting(vec![short]));

        assert!(matches!(source.decode_one(2), Err(CoreError::Decode(_))));
        assert!(source.read_at(2).unwrap().is_none());
    }

    #[test]
    fn test_spawn_failure_is_not_found() {
        let source =
            FfmpegFrameSource::from_parts("/v.mp4", stream_info(10), MockFfmpegSpawner::missing_binary());
        assert!(source.read_at(0).unwrap().is_none());
    }

    #[test]
    fn test_open_missing_file_is_input_not_found() {
        let result = FfmpegFrameSource::open(Path::new("/no/such/video.mp4"));
        assert!(matches!(result, Err(CoreError::InputNotFound(_))));
    }

    #[test]
    fn test_open_non_video_is_source_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_video.mp4");
        std::fs::write(&path, b"definitely not a container").unwrap();

        match FfmpegFrameSource::open(&path) {
            Err(err) => assert!(matches!(err, CoreError::SourceOpen { .. }), "{err}"),
            Ok(_) => panic!("garbage input must not open"),
        }
    }

    #[test]
    fn test_in_memory_source_reads_by_ordinal() {
        let frames = vec![
            RgbImage::from_pixel(2, 2, image::Rgb([1, 1, 1])),
            RgbImage::from_pixel(2, 2, image::Rgb([2, 2, 2])),
        ];
        let source = InMemoryFrameSource::new(frames, 24.0);

        assert_eq!(source.total_frames(), 2);
        assert_eq!(source.frame_rate(), 24.0);
        assert_eq!(source.read_at(1).unwrap().unwrap().get_pixel(0, 0)[0], 2);
        assert!(source.read_at(2).unwrap().is_none());
    }
}
