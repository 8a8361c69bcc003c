// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::log_err;

/// GPU failures, split by severity.
///
/// `DeviceUnavailable` and `DeviceRequest` are fatal to rendering and are
/// reported exactly once at startup.  `AllocationFailed` is per-surface and
/// recoverable: the caller falls back to the unfiltered display path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter available")]
    DeviceUnavailable,
    #[error("GPU device request failed: {0}")]
    DeviceRequest(String),
    #[error("render target allocation failed for {width}x{height}")]
    AllocationFailed { width: u32, height: u32 },
    #[error("source image has zero extent")]
    EmptyImage,
}

/// Core wgpu resources shared by every render surface.
///
/// Created once at startup by the composition root.  Failure here means the
/// process cannot render at all; it is logged once and surfaced as an error
/// rather than retried per frame.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
}

impl GpuContext {
    /// Create a GPU context.  Tries a hardware adapter first, then the
    /// software rasterizer (`force_fallback_adapter`) so headless machines
    /// still work.
    ///
    /// `pollster::block_on` keeps the async wgpu init out of the public API;
    /// the composition root has no executor at this point.
    pub fn new(preferred_gpu: &str) -> Result<Self, GpuError> {
        match pollster::block_on(Self::new_async(preferred_gpu, false)) {
            Ok(ctx) => Ok(ctx),
            Err(first) => {
                log_err!("hardware adapter init failed ({}), trying software fallback", first);
                pollster::block_on(Self::new_async(preferred_gpu, true)).inspect_err(|e| {
                    log_err!("GPU unavailable, rendering disabled: {}", e);
                })
            }
        }
    }

    async fn new_async(preferred_gpu: &str, force_fallback: bool) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power = match preferred_gpu.to_lowercase().as_str() {
            "low power" | "integrated" => wgpu::PowerPreference::LowPower,
            _ => wgpu::PowerPreference::HighPerformance,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power,
                compatible_surface: None, // offscreen targets only
                force_fallback_adapter: force_fallback,
            })
            .await
            .ok_or(GpuError::DeviceUnavailable)?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("PhotoFE GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
        })
    }

    /// Whether a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width > 0
            && height > 0
            && width <= self.max_texture_dim
            && height <= self.max_texture_dim
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
