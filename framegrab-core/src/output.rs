//! Naming and persistence of accepted frames.
//!
//! File names encode the frame ordinal and its scores:
//! `frame_{ordinal:06}_q{quality:02}_b{blur:02}[_watermarked].{jpg|png}`,
//! with both scores truncated to integers. The ordinal alone makes a name
//! unique within a run, so concurrent workers never collide.

use crate::analysis::FrameScores;
use crate::error::CoreResult;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// JPEG quality for saved frames.
pub const JPEG_QUALITY: u8 = 95;

/// Output file name for one frame.
pub fn frame_file_name(
    ordinal: u64,
    quality: f64,
    blur: f64,
    watermarked: bool,
    extension: &str,
) -> String {
    let suffix = if watermarked { "_watermarked" } else { "" };
    format!(
        "frame_{:06}_q{:02}_b{:02}{}.{}",
        ordinal,
        quality.max(0.0).trunc() as u64,
        blur.max(0.0).trunc() as u64,
        suffix,
        extension
    )
}

/// Writes accepted frames into one output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    use_png: bool,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, use_png: bool) -> Self {
        Self {
            dir: dir.into(),
            use_png,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &'static str {
        if self.use_png { "png" } else { "jpg" }
    }

    /// Destination path for a frame with the given scores.
    pub fn path_for(&self, ordinal: u64, scores: &FrameScores, watermarked: bool) -> PathBuf {
        self.dir.join(frame_file_name(
            ordinal,
            scores.quality,
            scores.blur,
            watermarked,
            self.extension(),
        ))
    }

    /// Encodes and writes `frame`, returning the path written.
    pub fn write(
        &self,
        frame: &RgbImage,
        ordinal: u64,
        scores: &FrameScores,
        watermarked: bool,
    ) -> CoreResult<PathBuf> {
        let path = self.path_for(ordinal, scores, watermarked);

        if self.use_png {
            frame.save_with_format(&path, ImageFormat::Png)?;
        } else {
            let writer = BufWriter::new(File::create(&path)?);
            let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
            encoder.encode_image(frame)?;
        }

        log::debug!("Saved {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::collections::HashSet;

    #[test]
    fn test_file_name_format() {
        assert_eq!(
            frame_file_name(150, 45.9, 312.7, false, "jpg"),
            "frame_000150_q45_b312.jpg"
        );
        assert_eq!(
            frame_file_name(7, 3.2, 0.4, true, "png"),
            "frame_000007_q03_b00_watermarked.png"
        );
        assert_eq!(
            frame_file_name(1_234_567, 100.0, 12.0, false, "jpg"),
            "frame_1234567_q100_b12.jpg"
        );
    }

    #[test]
    fn test_names_unique_with_equal_scores() {
        let names: HashSet<String> = (0..500)
            .map(|ordinal| frame_file_name(ordinal, 50.0, 50.0, false, "jpg"))
            .collect();
        assert_eq!(names.len(), 500);
    }

    #[test]
    fn test_write_jpeg_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let frame = RgbImage::from_pixel(16, 9, Rgb([10, 200, 30]));
        let scores = FrameScores {
            quality: 40.0,
            blur: 20.0,
        };

        let jpg = OutputWriter::new(dir.path(), false)
            .write(&frame, 3, &scores, false)
            .unwrap();
        assert_eq!(jpg.file_name().unwrap(), "frame_000003_q40_b20.jpg");
        let decoded = image::open(&jpg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 9));

        let png = OutputWriter::new(dir.path(), true)
            .write(&frame, 3, &scores, true)
            .unwrap();
        assert_eq!(png.file_name().unwrap(), "frame_000003_q40_b20_watermarked.png");
        assert_eq!(image::open(&png).unwrap().into_rgb8(), frame);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("missing"), false);
        let frame = RgbImage::new(2, 2);
        let scores = FrameScores {
            quality: 1.0,
            blur: 1.0,
        };
        assert!(writer.write(&frame, 0, &scores, false).is_err());
    }
}
