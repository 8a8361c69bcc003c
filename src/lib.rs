// ============================================================================
// PHOTOFE CORE — filter registry, render-surface pool, display geometry
// ============================================================================
//
// Library crate backing the PhotoFE camera app.  The GUI shell, the capture
// pipeline and the photo library browser live elsewhere; this crate owns the
// parts they all share:
//
//   filter/     — parameter tables, the generic filter descriptor, built-ins
//   ops/        — the actual pixel kernels (CPU, rayon-parallel)
//   catalog     — category → key registry, selection, user overlay merge
//   store       — persisted per-filter user metadata (hidden/favourite/rating)
//   transform   — orientation-aware image→surface placement + inverse mapping
//   gpu/        — wgpu device bootstrap, pooled render surfaces, presenter
//   source      — injected image supplier interface
//   logger      — session log file + logging macros
//
// Threading rule: everything that touches a `RenderSurfacePool`, a
// `SurfaceRenderer` or a descriptor's `apply()` runs on ONE thread (the
// render thread).  Parameter reads/writes are plain value mutations and may
// be staged elsewhere, but they must reach the render thread through the
// usual &mut ownership before the next `apply()`.
// ============================================================================

#![allow(clippy::too_many_arguments)]

pub mod logger;

pub mod catalog;
pub mod filter;
pub mod gpu;
pub mod ops;
pub mod source;
pub mod store;
pub mod transform;

pub use catalog::{Category, FilterCatalog};
pub use filter::descriptor::{FilterDescriptor, FilterError, FilterOp};
pub use filter::library::{FilterDefinition, builtin_definitions};
pub use filter::params::{
    PARAMETER_NOT_SET, ParamRange, ParamValue, ParameterKind, ParameterSpec, Rgba,
};
pub use gpu::context::{GpuContext, GpuError};
pub use gpu::pool::RenderSurfacePool;
pub use gpu::renderer::SurfaceRenderer;
pub use gpu::surface::RenderSurface;
pub use source::{ImageSource, TestPatternSource};
pub use store::{FileOverlayStore, MemoryOverlayStore, OverlayStore, UserOverlay};
pub use transform::{Extent, FitMode, Placement, Rotation};

use std::path::PathBuf;

/// Settings consumed by the composition root when wiring the core up.
///
/// The app reads these from its persisted settings screen; tests and tools
/// just take the defaults.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Adapter preference passed to [`GpuContext::new`]:
    /// "high performance", "low power" or anything else for the default.
    pub preferred_gpu: String,
    /// Where the overlay store file lives.  `None` selects the in-memory
    /// store (nothing persists across sessions).
    pub overlay_path: Option<PathBuf>,
    /// Device pixel ratio applied to freshly acquired render surfaces.
    pub pixel_ratio: f32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            preferred_gpu: "high performance".to_string(),
            overlay_path: None,
            pixel_ratio: 1.0,
        }
    }
}
