// ============================================================================
// SURFACE RENDERER — draws a filtered image onto a pooled render surface
// ============================================================================
//
// One pipeline shared by every surface.  Each present computes the display
// placement (rotate → scale → translate), memoizes it on the surface for
// later touch mapping, uploads the image and draws a textured quad through
// the combined transform.
//
// Superseded requests: there is no cancellation here.  A caller that
// switched filters while a present was in flight discards the stale result
// by comparing keys — latest request wins, stale frames are dropped
// silently.
// ============================================================================

use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::gpu::context::{GpuContext, GpuError};
use crate::gpu::shaders;
use crate::gpu::surface::RenderSurface;
use crate::transform::{Extent, Placement, Rotation};

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct TransformUniform {
    matrix: [[f32; 4]; 4],
    image_size: [f32; 2],
    _pad: [f32; 2],
}

impl TransformUniform {
    /// Affine placement (y-up device pixels) folded together with the
    /// orthographic device→NDC projection, column-major for WGSL.
    fn from_placement(p: &Placement) -> Self {
        let s = p.scale;
        // dx = a*x + c*y + tx ; dy = b*x + d*y + ty
        let (a, b, c, d) = match p.rotation {
            Rotation::None => (s, 0.0, 0.0, s),
            Rotation::Plus90 => (0.0, s, -s, 0.0),
            Rotation::Minus90 => (0.0, -s, s, 0.0),
        };
        let sw = p.surface.width;
        let sh = p.surface.height;
        Self {
            matrix: [
                [2.0 * a / sw, 2.0 * b / sh, 0.0, 0.0],
                [2.0 * c / sw, 2.0 * d / sh, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [
                    2.0 * p.origin_x / sw - 1.0,
                    2.0 * p.origin_y / sh - 1.0,
                    0.0,
                    1.0,
                ],
            ],
            image_size: [p.image.width, p.image.height],
            _pad: [0.0; 2],
        }
    }
}

pub struct SurfaceRenderer {
    ctx: Arc<GpuContext>,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl SurfaceRenderer {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("present_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PRESENT_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("present_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("present_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("present_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_present",
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_present",
                targets: &[Some(wgpu::ColorTargetState {
                    format: RenderSurface::FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("present_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { ctx, pipeline, bind_group_layout, sampler }
    }

    /// Render `image` onto `surface` through the computed placement and
    /// submit the pass.  Returns the placement so callers can line overlays
    /// up with the drawn frame.
    pub fn present(
        &self,
        surface: &mut RenderSurface,
        image: &RgbaImage,
    ) -> Result<Placement, GpuError> {
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 {
            return Err(GpuError::EmptyImage);
        }

        let placement = surface.record_render(Extent::of_image(image));
        self.upload_source(surface, image);

        let uniform = TransformUniform::from_placement(&placement);
        let uniform_buf = self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("present_uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let (source_tex, _, _) = surface.source.as_ref().expect("uploaded above");
        let source_view = source_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("present_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("present_encoder") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("present_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.ctx.submit_one(encoder);

        Ok(placement)
    }

    /// Upload the source image, reusing the cached texture when the extent
    /// matches the previous frame (the common gallery case).
    fn upload_source(&self, surface: &mut RenderSurface, image: &RgbaImage) {
        let (w, h) = image.dimensions();
        let reusable = matches!(surface.source, Some((_, sw, sh)) if sw == w && sh == h);
        if !reusable {
            let texture = self.ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("present_source"),
                size: wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: RenderSurface::FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            surface.source = Some((texture, w, h));
        }

        let (texture, _, _) = surface.source.as_ref().expect("set above");
        self.ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::FitMode;

    #[test]
    fn uniform_matrix_maps_placement_to_ndc() {
        // landscape into landscape: fill, no rotation
        let p = Placement::compute(Extent::new(200.0, 100.0), Extent::new(200.0, 100.0));
        assert_eq!(p.fit, FitMode::Fill);
        let u = TransformUniform::from_placement(&p);

        // image origin lands at NDC (-1, -1)
        let m = u.matrix;
        let map = |x: f32, y: f32| -> (f32, f32) {
            (
                m[0][0] * x + m[1][0] * y + m[3][0],
                m[0][1] * x + m[1][1] * y + m[3][1],
            )
        };
        let (x0, y0) = map(0.0, 0.0);
        assert!((x0 + 1.0).abs() < 1e-5 && (y0 + 1.0).abs() < 1e-5);
        // image far corner lands at NDC (1, 1)
        let (x1, y1) = map(200.0, 100.0);
        assert!((x1 - 1.0).abs() < 1e-5 && (y1 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn uniform_matrix_respects_rotation() {
        let p = Placement::compute(Extent::new(100.0, 200.0), Extent::new(200.0, 100.0));
        let u = TransformUniform::from_placement(&p);
        let m = u.matrix;
        // with a +90 rotation, the x row picks up the image y coordinate
        assert_eq!(m[0][0], 0.0);
        assert!(m[1][0] != 0.0);
    }
}
