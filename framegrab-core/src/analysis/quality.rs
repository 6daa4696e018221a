//! Composite quality score and blur proxy.
//!
//! The composite combines five statistics of the luma plane:
//!
//! | metric    | raw value                          | normalization        | weight |
//! |-----------|------------------------------------|----------------------|--------|
//! | sharpness | variance of the Laplacian          | `clip(raw / 1000)`   | 0.30   |
//! | edges     | mean Sobel gradient magnitude      | `clip(raw / 100)`    | 0.20   |
//! | contrast  | `std / mean`                       | none                 | 0.20   |
//! | brightness| `mean / 255`                       | none                 | 0.10   |
//! | entropy   | Shannon entropy of the histogram   | `clip(raw / 8)`      | 0.20   |
//!
//! The weighted sum is scaled by 100 and clipped to `[0, 100]`. Contrast is
//! deliberately left unclipped before weighting; only the final score is.
//!
//! The blur proxy is the raw Laplacian variance, computed once and shared
//! with the sharpness term.

use super::{LumaView, to_luma};
use image::{GrayImage, RgbImage};

const SHARPNESS_SCALE: f64 = 1000.0;
const EDGE_SCALE: f64 = 100.0;
const ENTROPY_SCALE: f64 = 8.0;

const SHARPNESS_WEIGHT: f64 = 0.30;
const EDGE_WEIGHT: f64 = 0.20;
const CONTRAST_WEIGHT: f64 = 0.20;
const BRIGHTNESS_WEIGHT: f64 = 0.10;
const ENTROPY_WEIGHT: f64 = 0.20;

const MEAN_EPSILON: f64 = 1e-6;
const HIST_EPSILON: f64 = 1e-6;
const LOG_EPSILON: f64 = 1e-7;

/// Raw image statistics behind the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QualityMetrics {
    /// Variance of the Laplacian (also the blur proxy)
    pub sharpness: f64,
    /// Mean Sobel gradient magnitude
    pub edge_strength: f64,
    /// Standard deviation over mean
    pub contrast: f64,
    /// Mean luma scaled to 0-1
    pub brightness: f64,
    /// Shannon entropy of the 256-bin histogram, in bits
    pub entropy: f64,
}

/// Scores attached to a frame after analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameScores {
    /// Composite quality in `[0, 100]`
    pub quality: f64,
    /// Variance of the Laplacian, `>= 0`
    pub blur: f64,
}

impl QualityMetrics {
    /// Measures all five statistics on a luma plane.
    pub fn measure(luma: &GrayImage) -> Self {
        let (width, height) = luma.dimensions();
        let pixel_count = width as usize * height as usize;
        if pixel_count == 0 {
            return Self::default();
        }

        let view = LumaView::new(luma);
        let n = pixel_count as f64;

        // Single pass for the Laplacian and Sobel responses.
        let mut lap_sum = 0.0;
        let mut lap_sq_sum = 0.0;
        let mut grad_sum = 0.0;
        for y in 0..height as i64 {
            for x in 0..width as i64 {
                let lap = view.laplacian(x, y);
                lap_sum += lap;
                lap_sq_sum += lap * lap;

                let (dx, dy) = view.sobel(x, y);
                grad_sum += (dx * dx + dy * dy).sqrt();
            }
        }
        let lap_mean = lap_sum / n;
        let sharpness = (lap_sq_sum / n - lap_mean * lap_mean).max(0.0);
        let edge_strength = grad_sum / n;

        let mut histogram = [0u64; 256];
        let mut sum = 0.0;
        for &v in luma.as_raw() {
            histogram[v as usize] += 1;
            sum += v as f64;
        }
        let mean = sum / n;
        let variance = luma
            .as_raw()
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        let total = n + HIST_EPSILON;
        let entropy = -histogram
            .iter()
            .map(|&count| {
                let p = count as f64 / total;
                p * (p + LOG_EPSILON).log2()
            })
            .sum::<f64>();

        Self {
            sharpness,
            edge_strength,
            contrast: std_dev / (mean + MEAN_EPSILON),
            brightness: mean / 255.0,
            entropy: entropy.max(0.0),
        }
    }

    /// Weighted composite in `[0, 100]`.
    pub fn composite(&self) -> f64 {
        let sharpness_norm = (self.sharpness / SHARPNESS_SCALE).clamp(0.0, 1.0);
        let edge_norm = (self.edge_strength / EDGE_SCALE).clamp(0.0, 1.0);
        let entropy_norm = (self.entropy / ENTROPY_SCALE).clamp(0.0, 1.0);

        let score = (sharpness_norm * SHARPNESS_WEIGHT
            + edge_norm * EDGE_WEIGHT
            + self.contrast * CONTRAST_WEIGHT
            + self.brightness * BRIGHTNESS_WEIGHT
            + entropy_norm * ENTROPY_WEIGHT)
            * 100.0;

        if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
    }

    /// Blur proxy: the raw Laplacian variance.
    pub fn blur(&self) -> f64 {
        self.sharpness
    }
}

/// Scores an RGB frame: composite quality and blur proxy from one luma pass.
pub fn score_frame(frame: &RgbImage) -> FrameScores {
    let metrics = QualityMetrics::measure(&to_luma(frame));
    FrameScores {
        quality: metrics.composite(),
        blur: metrics.blur(),
    }
}
