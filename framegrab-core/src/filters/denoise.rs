//! Non-local means denoising for the deblock stage.
//!
//! Each output pixel is a weighted average of the pixels in a search window
//! around it, weighted by how similar their surrounding template patches are:
//! `w = exp(-d / h^2)` where `d` is the mean squared patch difference averaged
//! over the three channels.
//!
//! Patch distances are evaluated per search offset with an integral image of
//! the squared difference between the frame and its shifted copy, so the cost
//! per offset is constant per pixel regardless of template size. Rows are
//! split into bands that rayon processes independently.

use crate::analysis::reflect_101;
use image::RgbImage;
use rayon::prelude::*;

const CHANNELS: usize = 3;
const BAND_ROWS: usize = 16;

/// Non-local means parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlmParams {
    /// Filter strength; larger removes more noise and more detail.
    pub h: f32,
    /// Template patch is `(2 * template_radius + 1)` pixels square.
    pub template_radius: usize,
    /// Search window is `(2 * search_radius + 1)` pixels square.
    pub search_radius: usize,
}

impl Default for NlmParams {
    /// 7x7 template, 21x21 search window, h = 10.
    fn default() -> Self {
        Self {
            h: 10.0,
            template_radius: 3,
            search_radius: 10,
        }
    }
}

/// Frame copy padded with reflected borders so every shifted access is in range.
struct Padded {
    data: Vec<f32>,
    stride: usize,
    pad: usize,
}

impl Padded {
    fn new(frame: &RgbImage, pad: usize) -> Self {
        let (width, height) = (frame.width() as i64, frame.height() as i64);
        let padded_w = width as usize + 2 * pad;
        let padded_h = height as usize + 2 * pad;
        let raw = frame.as_raw();

        let mut data = Vec::with_capacity(padded_w * padded_h * CHANNELS);
        for py in 0..padded_h {
            let sy = reflect_101(py as i64 - pad as i64, height);
            for px in 0..padded_w {
                let sx = reflect_101(px as i64 - pad as i64, width);
                let base = (sy * width as usize + sx) * CHANNELS;
                data.extend(raw[base..base + CHANNELS].iter().map(|&v| v as f32));
            }
        }

        Self {
            data,
            stride: padded_w,
            pad,
        }
    }

    /// Pixel at frame coordinates `(x, y)`, which may reach `pad` outside the frame.
    #[inline]
    fn pixel(&self, x: i64, y: i64) -> &[f32] {
        let px = (x + self.pad as i64) as usize;
        let py = (y + self.pad as i64) as usize;
        let base = (py * self.stride + px) * CHANNELS;
        &self.data[base..base + CHANNELS]
    }
}

/// Denoises `frame` with non-local means.
pub fn denoise(frame: &RgbImage, params: &NlmParams) -> RgbImage {
    let (width, height) = (frame.width() as usize, frame.height() as usize);
    if width == 0 || height == 0 || params.h <= 0.0 {
        return frame.clone();
    }

    let t = params.template_radius as i64;
    let s = params.search_radius as i64;
    let padded = Padded::new(frame, (t + s) as usize);
    let template_area = ((2 * t + 1) * (2 * t + 1)) as f64;
    let inv_h2 = 1.0 / (params.h as f64 * params.h as f64);

    let mut output = vec![0u8; width * height * CHANNELS];
    output
        .par_chunks_mut(BAND_ROWS * width * CHANNELS)
        .enumerate()
        .for_each(|(band, out)| {
            let y0 = band * BAND_ROWS;
            let rows = out.len() / (width * CHANNELS);
            denoise_band(&padded, out, y0, rows, width, t, s, template_area, inv_h2);
        });

    RgbImage::from_raw(width as u32, height as u32, output).unwrap_or_else(|| frame.clone())
}

#[allow(clippy::too_many_arguments)]
fn denoise_band(
    padded: &Padded,
    out: &mut [u8],
    y0: usize,
    rows: usize,
    width: usize,
    t: i64,
    s: i64,
    template_area: f64,
    inv_h2: f64,
) {
    // Region covered by the integral image: band rows and columns grown by the
    // template radius on every side.
    let region_w = width + 2 * t as usize;
    let region_h = rows + 2 * t as usize;
    let ii_stride = region_w + 1;

    let mut integral = vec![0f64; ii_stride * (region_h + 1)];
    let mut weight_sum = vec![0f64; rows * width];
    let mut value_sum = vec![0f64; rows * width * CHANNELS];

    for dy in -s..=s {
        for dx in -s..=s {
            // Integral image of the per-pixel squared difference to the shifted frame.
            for ry in 0..region_h {
                let y = y0 as i64 + ry as i64 - t;
                let mut row_acc = 0f64;
                for rx in 0..region_w {
                    let x = rx as i64 - t;
                    let a = padded.pixel(x, y);
                    let b = padded.pixel(x + dx, y + dy);
                    let diff: f32 = a.iter().zip(b).map(|(p, q)| (p - q) * (p - q)).sum();
                    row_acc += diff as f64 / CHANNELS as f64;
                    integral[(ry + 1) * ii_stride + rx + 1] =
                        integral[ry * ii_stride + rx + 1] + row_acc;
                }
            }

            let span = 2 * t as usize + 1;
            for ly in 0..rows {
                for x in 0..width {
                    // Template centred on (x, ly) spans region rows ly..ly+span.
                    let top = ly * ii_stride + x;
                    let bottom = (ly + span) * ii_stride + x;
                    let patch = integral[bottom + span] - integral[bottom] - integral[top + span]
                        + integral[top];
                    let distance = (patch / template_area).max(0.0);
                    let weight = (-distance * inv_h2).exp();

                    let idx = ly * width + x;
                    weight_sum[idx] += weight;
                    let neighbour = padded.pixel(x as i64 + dx, (y0 + ly) as i64 + dy);
                    for c in 0..CHANNELS {
                        value_sum[idx * CHANNELS + c] += weight * neighbour[c] as f64;
                    }
                }
            }
        }
    }

    for (idx, &w) in weight_sum.iter().enumerate() {
        for c in 0..CHANNELS {
            let v = value_sum[idx * CHANNELS + c] / w;
            out[idx * CHANNELS + c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn variance(frame: &RgbImage) -> f64 {
        let raw = frame.as_raw();
        let n = raw.len() as f64;
        let mean = raw.iter().map(|&v| v as f64).sum::<f64>() / n;
        raw.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
    }

    fn noisy_gray(size: u32) -> RgbImage {
        let mut state: u32 = 0x1234_5678;
        RgbImage::from_fn(size, size, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = ((state >> 24) % 11) as i32 - 5;
            let v = (128 + noise) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_uniform_frame_is_unchanged() {
        let frame = RgbImage::from_pixel(20, 18, Rgb([77, 140, 200]));
        let out = denoise(&frame, &NlmParams::default());
        assert_eq!(out, frame);
    }

    #[test]
    fn test_noise_variance_drops() {
        let frame = noisy_gray(24);
        let out = denoise(&frame, &NlmParams::default());
        assert_eq!(out.dimensions(), frame.dimensions());
        let before = variance(&frame);
        let after = variance(&out);
        assert!(after < before * 0.5, "variance {before} -> {after}");
    }

    #[test]
    fn test_strong_edge_survives() {
        let frame = RgbImage::from_fn(24, 24, |x, _| {
            if x < 12 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let out = denoise(&frame, &NlmParams::default());
        assert!(out.get_pixel(2, 12)[0] < 10);
        assert!(out.get_pixel(21, 12)[0] > 245);
    }

    #[test]
    fn test_tiny_frames() {
        let single = RgbImage::from_pixel(1, 1, Rgb([9, 9, 9]));
        assert_eq!(denoise(&single, &NlmParams::default()), single);
        let empty = RgbImage::new(0, 0);
        assert_eq!(denoise(&empty, &NlmParams::default()).dimensions(), (0, 0));
    }
}
