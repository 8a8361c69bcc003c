// ============================================================================
// RENDER SURFACE POOL — recycle GPU surfaces to avoid create/destroy churn
// ============================================================================
//
// Galleries acquire and release the same keys many times per second while
// scrolling, so `release` only marks a surface reusable; the allocation
// stays warm for the next `acquire` of the same key.  Disposal is explicit
// (`evict` / `clear`).  At most one surface exists per key at any time.
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use crate::gpu::context::{GpuContext, GpuError};
use crate::gpu::surface::RenderSurface;
use crate::log_warn;

pub struct RenderSurfacePool {
    ctx: Arc<GpuContext>,
    surfaces: HashMap<String, RenderSurface>,
    next_serial: u64,
}

impl RenderSurfacePool {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx, surfaces: HashMap::new(), next_serial: 0 }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    /// The surface for `key`, created on first request.  A cached surface
    /// whose extent differs from the request is resized in place (same
    /// identity, fresh target).
    ///
    /// Allocation failure is recoverable: the caller shows the unfiltered
    /// image for this cell and tries again at the next layout pass.
    pub fn acquire(
        &mut self,
        key: &str,
        width: u32,
        height: u32,
    ) -> Result<&mut RenderSurface, GpuError> {
        if !self.surfaces.contains_key(key) {
            let serial = self.next_serial;
            let surface = RenderSurface::new(&self.ctx, width, height, serial).inspect_err(|e| {
                log_warn!("surface allocation failed for {}: {}", key, e);
            })?;
            self.next_serial += 1;
            self.surfaces.insert(key.to_string(), surface);
        }

        let ctx = Arc::clone(&self.ctx);
        let surface = self.surfaces.get_mut(key).expect("inserted above");
        surface.ensure_extent(&ctx, width, height)?;
        surface.released = false;
        Ok(surface)
    }

    /// Surface for `key` if one is live, without creating it.
    pub fn get(&self, key: &str) -> Option<&RenderSurface> {
        self.surfaces.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RenderSurface> {
        self.surfaces.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.surfaces.contains_key(key)
    }

    /// Mark the surface reusable.  Not reference-counted: a second release
    /// of the same key is a no-op, and the surface stays valid for any
    /// subsequent `acquire`.
    pub fn release(&mut self, key: &str) {
        if let Some(surface) = self.surfaces.get_mut(key) {
            surface.released = true;
        }
    }

    /// Whether the surface is currently marked released.
    pub fn is_released(&self, key: &str) -> bool {
        self.surfaces.get(key).is_some_and(|s| s.released)
    }

    /// Actually dispose of the surface.  Returns whether one existed.
    pub fn evict(&mut self, key: &str) -> bool {
        self.surfaces.remove(key).is_some()
    }

    /// Dispose of every released surface (memory pressure).
    pub fn evict_released(&mut self) {
        self.surfaces.retain(|_, surface| !surface.released);
    }

    /// Drop everything (shutdown, device loss).
    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    /// Number of live surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Approximate GPU memory held by pooled surfaces (bytes).
    pub fn pooled_memory_bytes(&self) -> usize {
        self.surfaces
            .values()
            .map(|s| s.width() as usize * s.height() as usize * 4)
            .sum()
    }
}
