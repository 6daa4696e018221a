// ============================================================================
// framegrab-core/src/preprocess/wgpu_backend.rs
// ============================================================================
//
// WGPU COMPUTE BACKEND: GpuContext over a wgpu device
//
// Samples live in storage buffers keyed by DeviceBuffer id. Scaling runs a
// single WGSL compute pass; downloads copy into a mappable staging buffer and
// block on the device until the map completes. Only compiled with the `gpu`
// feature.

use super::{DeviceBuffer, GpuContext};
use crate::error::{CoreError, CoreResult};

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 256;

/// Per-dimension dispatch limit guaranteed by every wgpu backend.
const MAX_WORKGROUPS_PER_DIM: u32 = 65_535;

const SCALE_SHADER: &str = r#"
struct Params {
    factor_bits: u32,
    len: u32,
    _pad0: u32,
    _pad1: u32,
};

@group(0) @binding(0) var<storage, read_write> samples: array<f32>;
@group(0) @binding(1) var<uniform> params: Params;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) id: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>,
) {
    let i = id.x + id.y * nwg.x * 256u;
    if (i < params.len) {
        samples[i] = samples[i] * bitcast<f32>(params.factor_bits);
    }
}
"#;

/// GPU context backed by a wgpu adapter.
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    name: String,
    next_id: AtomicU64,
    buffers: Mutex<HashMap<u64, wgpu::Buffer>>,
}

impl WgpuContext {
    /// Requests a high-performance adapter and builds the scaling pipeline.
    pub fn acquire() -> CoreResult<Self> {
        pollster::block_on(Self::acquire_async())
    }

    async fn acquire_async() -> CoreResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| CoreError::Gpu("no compatible GPU adapter found".to_string()))?;

        let name = adapter.get_info().name;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("framegrab"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                },
                None,
            )
            .await
            .map_err(|e| CoreError::Gpu(format!("failed to open device {}: {}", name, e)))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scale"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SCALE_SHADER)),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("scale"),
            layout: None,
            module: &module,
            entry_point: "main",
        });

        log::debug!("Acquired wgpu device {}", name);
        Ok(Self {
            device,
            queue,
            pipeline,
            name,
            next_id: AtomicU64::new(0),
            buffers: Mutex::new(HashMap::new()),
        })
    }

    fn take_buffer(&self, id: u64) -> CoreResult<wgpu::Buffer> {
        self.buffers
            .lock()
            .map_err(|_| CoreError::Gpu("buffer table poisoned".to_string()))?
            .remove(&id)
            .ok_or_else(|| CoreError::Gpu(format!("unknown device buffer {}", id)))
    }
}

/// Splits `groups` across x and y so neither exceeds the dispatch limit.
fn dispatch_dims(groups: u32) -> (u32, u32) {
    let x = groups.clamp(1, MAX_WORKGROUPS_PER_DIM);
    (x, groups.div_ceil(x).max(1))
}

impl GpuContext for WgpuContext {
    fn device_name(&self) -> String {
        self.name.clone()
    }

    fn upload(&self, samples: &[f32]) -> CoreResult<DeviceBuffer> {
        if samples.is_empty() {
            return Err(CoreError::Gpu("cannot upload an empty buffer".to_string()));
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("samples"),
                contents: bytemuck::cast_slice(samples),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            });

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.buffers
            .lock()
            .map_err(|_| CoreError::Gpu("buffer table poisoned".to_string()))?
            .insert(id, buffer);
        Ok(DeviceBuffer {
            id,
            len: samples.len(),
        })
    }

    fn scale(&self, buffer: &DeviceBuffer, factor: f32) -> CoreResult<()> {
        let len = u32::try_from(buffer.len)
            .map_err(|_| CoreError::Gpu(format!("buffer of {} samples is too large", buffer.len)))?;
        let params: [u32; 4] = [factor.to_bits(), len, 0, 0];
        let uniform = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scale-params"),
                contents: bytemuck::cast_slice(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let buffers = self
            .buffers
            .lock()
            .map_err(|_| CoreError::Gpu("buffer table poisoned".to_string()))?;
        let storage = buffers
            .get(&buffer.id)
            .ok_or_else(|| CoreError::Gpu(format!("unknown device buffer {}", buffer.id)))?;

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scale"),
            layout: &self.pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: storage.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });

        let (x, y) = dispatch_dims(len.div_ceil(WORKGROUP_SIZE));
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("scale") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("scale"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(x, y, 1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn download(&self, buffer: DeviceBuffer) -> CoreResult<Vec<f32>> {
        let storage = self.take_buffer(buffer.id)?;
        let size = storage.size();

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("download") });
        encoder.copy_buffer_to_buffer(&storage, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| CoreError::Gpu("device lost while mapping buffer".to_string()))?
            .map_err(|e| CoreError::Gpu(format!("failed to map buffer: {}", e)))?;

        let samples = {
            let bytes = slice.get_mapped_range();
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect::<Vec<f32>>()
        };
        staging.unmap();
        storage.destroy();
        Ok(samples)
    }
}
