// ============================================================================
// framegrab-core/src/preprocess/mod.rs
// ============================================================================
//
// FRAME PREPROCESSING: Optional GPU-accelerated adjustment before scoring
//
// When GPU use is requested each decoded frame is uploaded as normalized f32
// samples, brightened by a fixed factor on the device, and downloaded again
// before it is scored. The device is reached through the GpuContext trait.
// Builds with the `gpu` feature acquire a wgpu compute device; without the
// feature, or when no adapter is found, the preprocessor degrades to a
// pass-through and logs a single warning.
//
// KEY COMPONENTS:
// - FramePreprocessor: Trait applied to every decoded frame
// - PassThrough: Default preprocessor that returns frames unchanged
// - GpuContext: Device capability (upload, scale, download)
// - GpuBrightness: Brightness boost through a GpuContext
// - WgpuContext: wgpu compute backend (feature `gpu`)
//
// A failure on any individual frame is logged and the original frame is used.

use crate::config::VideoConfig;
use crate::error::{CoreError, CoreResult};
use image::RgbImage;

#[cfg(feature = "gpu")]
mod wgpu_backend;

#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuContext;

/// Brightness multiplier applied on the device.
pub const GPU_BRIGHTNESS_FACTOR: f32 = 1.2;

/// Transformation applied to every decoded frame before analysis.
pub trait FramePreprocessor: Send + Sync {
    fn prepare(&self, frame: RgbImage) -> RgbImage;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Returns frames untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl FramePreprocessor for PassThrough {
    fn prepare(&self, frame: RgbImage) -> RgbImage {
        frame
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Opaque handle to samples resident on a device.
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceBuffer {
    pub id: u64,
    pub len: usize,
}

/// Minimal device capability used by [`GpuBrightness`].
pub trait GpuContext: Send + Sync {
    /// Human readable device name.
    fn device_name(&self) -> String;

    /// Copies host samples to the device.
    fn upload(&self, samples: &[f32]) -> CoreResult<DeviceBuffer>;

    /// Multiplies every sample of `buffer` by `factor` in place.
    fn scale(&self, buffer: &DeviceBuffer, factor: f32) -> CoreResult<()>;

    /// Copies samples back to the host and releases the buffer.
    fn download(&self, buffer: DeviceBuffer) -> CoreResult<Vec<f32>>;
}

/// Attempts to acquire a compute device.
///
/// With the `gpu` feature this requests a wgpu adapter and device. Errors
/// mean callers fall back to CPU pass-through.
#[cfg(feature = "gpu")]
pub fn acquire_gpu_context() -> CoreResult<Box<dyn GpuContext>> {
    Ok(Box::new(WgpuContext::acquire()?))
}

/// Attempts to acquire a compute device.
///
/// Built without the `gpu` feature, so the device is always unavailable.
#[cfg(not(feature = "gpu"))]
pub fn acquire_gpu_context() -> CoreResult<Box<dyn GpuContext>> {
    Err(CoreError::Gpu(
        "no GPU compute backend is available in this build".to_string(),
    ))
}

/// Brightness boost executed on a GPU context.
pub struct GpuBrightness {
    context: Option<Box<dyn GpuContext>>,
    factor: f32,
}

impl GpuBrightness {
    /// Acquires a device; without one the preprocessor passes frames through.
    pub fn new() -> Self {
        match acquire_gpu_context() {
            Ok(context) => Self::with_context(context),
            Err(e) => {
                log::warn!("GPU acceleration unavailable, continuing on CPU: {}", e);
                Self {
                    context: None,
                    factor: GPU_BRIGHTNESS_FACTOR,
                }
            }
        }
    }

    /// Uses an already acquired context.
    pub fn with_context(context: Box<dyn GpuContext>) -> Self {
        log::info!("GPU acceleration enabled on {}", context.device_name());
        Self {
            context: Some(context),
            factor: GPU_BRIGHTNESS_FACTOR,
        }
    }

    /// True when a device was acquired.
    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }

    fn brighten(&self, context: &dyn GpuContext, frame: &RgbImage) -> CoreResult<RgbImage> {
        let samples: Vec<f32> = frame.as_raw().iter().map(|&v| v as f32 / 255.0).collect();

        let buffer = context.upload(&samples)?;
        context.scale(&buffer, self.factor)?;
        let scaled = context.download(buffer)?;

        if scaled.len() != samples.len() {
            return Err(CoreError::Gpu(format!(
                "device returned {} samples, expected {}",
                scaled.len(),
                samples.len()
            )));
        }

        let data: Vec<u8> = scaled
            .iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();

        RgbImage::from_raw(frame.width(), frame.height(), data)
            .ok_or_else(|| CoreError::Gpu("downloaded buffer does not match frame size".to_string()))
    }
}

impl Default for GpuBrightness {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePreprocessor for GpuBrightness {
    fn prepare(&self, frame: RgbImage) -> RgbImage {
        let Some(context) = self.context.as_deref() else {
            return frame;
        };
        match self.brighten(context, &frame) {
            Ok(adjusted) => adjusted,
            Err(e) => {
                log::error!("GPU preprocessing failed, using original frame: {}", e);
                frame
            }
        }
    }

    fn name(&self) -> &'static str {
        if self.is_active() { "gpu-brightness" } else { "none" }
    }
}

/// Builds the preprocessor selected by `config.use_gpu`.
pub fn preprocessor_for(config: &VideoConfig) -> Box<dyn FramePreprocessor> {
    if config.use_gpu {
        Box::new(GpuBrightness::new())
    } else {
        Box::new(PassThrough)
    }
}
