// ============================================================================
// RENDER SURFACE — GPU render target + memoized display placement
// ============================================================================
//
// One surface per filter key, owned by the pool.  Besides the wgpu texture
// it remembers what was last rendered onto it: the source image extent and
// the `Placement` the forward pass used.  Touch-mapping queries answer from
// that memoized state — surface extents can change between a render and a
// query, and recomputing would break the mapping.
// ============================================================================

use crate::gpu::context::{GpuContext, GpuError};
use crate::transform::{Extent, Placement};

pub struct RenderSurface {
    pub(crate) target: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    /// Cached upload texture for the source image, recreated when the
    /// incoming extent changes (gallery scrolling re-renders the same sizes
    /// over and over).
    pub(crate) source: Option<(wgpu::Texture, u32, u32)>,
    width: u32,
    height: u32,
    pixel_ratio: f32,
    /// Extent of the last image rendered onto this surface.
    image_extent: Option<Extent>,
    /// Transform used by the last forward pass.
    placement: Option<Placement>,
    /// Set by `release`; cleared on the next acquire.
    pub(crate) released: bool,
    serial: u64,
}

impl RenderSurface {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub(crate) fn new(
        ctx: &GpuContext,
        width: u32,
        height: u32,
        serial: u64,
    ) -> Result<Self, GpuError> {
        if !ctx.supports_size(width, height) {
            return Err(GpuError::AllocationFailed { width, height });
        }
        let (target, view) = Self::create_target(ctx, width, height);
        Ok(Self {
            target,
            view,
            source: None,
            width,
            height,
            pixel_ratio: 1.0,
            image_extent: None,
            placement: None,
            released: false,
            serial,
        })
    }

    fn create_target(ctx: &GpuContext, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("RenderSurface target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        (target, view)
    }

    /// Resize the render target if the requested extent differs.  The
    /// memoized placement intentionally survives a resize: inverse queries
    /// keep answering against the state of the last actual render.
    pub(crate) fn ensure_extent(
        &mut self,
        ctx: &GpuContext,
        width: u32,
        height: u32,
    ) -> Result<(), GpuError> {
        if self.width == width && self.height == height {
            return Ok(());
        }
        if !ctx.supports_size(width, height) {
            return Err(GpuError::AllocationFailed { width, height });
        }
        let (target, view) = Self::create_target(ctx, width, height);
        self.target = target;
        self.view = view;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width as f32, self.height as f32)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Identity of the underlying allocation; stable across renders and
    /// resizes, unique per surface within the pool.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Device pixels per view unit for touch mapping (the platform's screen
    /// scale).  Applies to subsequent queries, not retroactively.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio > 0.0 {
            self.pixel_ratio = ratio;
        }
    }

    /// Compute and memoize the placement for an image about to be rendered.
    /// Called by the presenter on every forward pass.
    pub(crate) fn record_render(&mut self, image: Extent) -> Placement {
        let placement = Placement::compute(image, self.extent());
        self.image_extent = Some(image);
        self.placement = Some(placement);
        placement
    }

    /// Extent of the last rendered image, if any.
    pub fn image_extent(&self) -> Option<Extent> {
        self.image_extent
    }

    /// The memoized placement, if anything was rendered yet.
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    fn placement_or_default(&self, default_image: Extent) -> Placement {
        self.placement
            .unwrap_or_else(|| Placement::compute(default_image, self.extent()))
    }

    /// Touch point (view units, y-down) → image pixel position.
    ///
    /// Before the first render there is no memoized placement; the mapping
    /// falls back to `default_image` instead of failing, mirroring how the
    /// editor probes a surface that is still waiting for its first frame.
    pub fn view_to_image(&self, x: f32, y: f32, default_image: Extent) -> (f32, f32) {
        self.placement_or_default(default_image)
            .view_to_image(x, y, self.pixel_ratio)
    }

    /// Image pixel position → touch point (view units, y-down).
    pub fn image_to_view(&self, x: f32, y: f32, default_image: Extent) -> (f32, f32) {
        self.placement_or_default(default_image)
            .image_to_view(x, y, self.pixel_ratio)
    }
}
