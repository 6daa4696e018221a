//! Per-frame image analysis.
//!
//! Everything in here is a pure function of the pixel buffer, which is what
//! lets sequential and parallel runs agree on every decision.
//!
//! - [`quality`]: composite quality score and the blur proxy
//! - [`watermark`]: corner watermark heuristic

pub mod quality;
pub mod watermark;

pub use quality::{FrameScores, QualityMetrics, score_frame};
pub use watermark::{BoundingBox, CornerRegions, Rect, detect_watermark};

use image::{GrayImage, RgbImage};

/// Converts RGB to 8-bit luma with BT.601 weights.
///
/// Uses the same 14-bit fixed point rounding as common video tooling
/// (`0.299 R + 0.587 G + 0.114 B`) so scores are reproducible.
pub fn to_luma(frame: &RgbImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;

    let (width, height) = frame.dimensions();
    let data: Vec<u8> = frame
        .pixels()
        .map(|p| {
            let y = (p[0] as u32 * R + p[1] as u32 * G + p[2] as u32 * B + (1 << (SHIFT - 1)))
                >> SHIFT;
            y.min(255) as u8
        })
        .collect();

    // Buffer length always matches the dimensions.
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Mirrors an out-of-range index back into `0..len` without repeating the edge
/// pixel (`gfedcb|abcdefgh|gfedcba`).
pub(crate) fn reflect_101(index: i64, len: i64) -> usize {
    if len <= 1 {
        return 0;
    }
    let mut i = index;
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        }
        if i >= len {
            i = 2 * len - 2 - i;
        }
    }
    i as usize
}

/// Borrowed view over a luma plane with reflected border access.
pub(crate) struct LumaView<'a> {
    data: &'a [u8],
    width: i64,
    height: i64,
}

impl<'a> LumaView<'a> {
    pub(crate) fn new(luma: &'a GrayImage) -> Self {
        Self {
            data: luma.as_raw(),
            width: luma.width() as i64,
            height: luma.height() as i64,
        }
    }

    #[inline]
    pub(crate) fn at(&self, x: i64, y: i64) -> f64 {
        let xi = reflect_101(x, self.width);
        let yi = reflect_101(y, self.height);
        self.data[yi * self.width as usize + xi] as f64
    }

    /// 4-neighbour Laplacian response at (x, y).
    #[inline]
    pub(crate) fn laplacian(&self, x: i64, y: i64) -> f64 {
        self.at(x, y - 1) + self.at(x, y + 1) + self.at(x - 1, y) + self.at(x + 1, y)
            - 4.0 * self.at(x, y)
    }

    /// 3x3 Sobel derivatives (dx, dy) at (x, y).
    #[inline]
    pub(crate) fn sobel(&self, x: i64, y: i64) -> (f64, f64) {
        let tl = self.at(x - 1, y - 1);
        let tc = self.at(x, y - 1);
        let tr = self.at(x + 1, y - 1);
        let ml = self.at(x - 1, y);
        let mr = self.at(x + 1, y);
        let bl = self.at(x - 1, y + 1);
        let bc = self.at(x, y + 1);
        let br = self.at(x + 1, y + 1);

        let dx = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
        let dy = (bl + 2.0 * bc + br) - (tl + 2.0 * tc + tr);
        (dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luma_weights() {
        let frame = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let luma = to_luma(&frame);
        assert_eq!(luma.get_pixel(0, 0)[0], 76);
        assert_eq!(luma.get_pixel(1, 0)[0], 150);
        assert_eq!(luma.get_pixel(2, 0)[0], 29);

        let white = to_luma(&RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])));
        assert_eq!(white.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
        assert_eq!(reflect_101(-3, 1), 0);
    }
}
