// ============================================================================
// GPU MODULE — pooled render surfaces for filter previews
// ============================================================================
//
// Architecture:
//   context.rs  — wgpu Device, Queue, adapter init (fatal-once on failure)
//   shaders.rs  — WGSL shader source (inline strings)
//   surface.rs  — RenderSurface: render target + memoized display placement
//   pool.rs     — keyed at-most-one-instance surface cache
//   renderer.rs — textured-quad presenter applying the placement transform
//
// Everything here runs on the render thread; see the crate-level docs for
// the threading rule.
// ============================================================================

pub mod context;
pub mod pool;
pub mod renderer;
pub mod shaders;
pub mod surface;

pub use context::{GpuContext, GpuError};
pub use pool::RenderSurfacePool;
pub use renderer::SurfaceRenderer;
pub use surface::RenderSurface;
