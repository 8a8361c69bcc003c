// ============================================================================
// PIPELINE INTEGRATION — catalog → descriptor → kernel → placement, end to end
// ============================================================================
//
// Everything except the pool/presenter tests is CPU-only.  The GPU tests
// skip themselves when no adapter exists so headless CI stays green.
// ============================================================================

use std::sync::Arc;

use photofe::{
    Category, Extent, FilterCatalog, FilterError, GpuContext, ImageSource, MemoryOverlayStore,
    PARAMETER_NOT_SET, RenderSurfacePool, SurfaceRenderer, TestPatternSource,
};

fn catalog() -> FilterCatalog {
    let mut catalog = FilterCatalog::new(Box::new(MemoryOverlayStore::new()));
    catalog.populate();
    catalog
}

#[test]
fn edit_preview_cancel_cycle() {
    let mut catalog = catalog();
    let source = TestPatternSource::new(320, 240);
    let image = source.current_image(None);

    let descriptor = catalog.descriptor("Brightness").expect("built-in");
    let committed = descriptor.parameter(0);

    // edit session: stash, drag the slider around, preview each step
    descriptor.stash_parameters();
    descriptor.set_parameter(0, 60.0);
    let preview = descriptor.apply(&image, None).expect("preview renders");
    assert_eq!(preview.dimensions(), image.dimensions());
    assert!(preview.get_pixel(160, 120).0[0] > image.get_pixel(160, 120).0[0]);

    // cancel: live values roll back exactly
    descriptor.restore_parameters();
    assert_eq!(descriptor.parameter(0), committed);
    let after_cancel = descriptor.apply(&image, None).expect("renders");
    assert_eq!(after_cancel, image);
}

#[test]
fn slider_ui_probes_every_index_safely() {
    let mut catalog = catalog();
    for key in ["Sepia", "Monochrome", "Preset", "Mono"] {
        let descriptor = catalog.descriptor(key).expect(key);
        // one past the end, exactly how a generic slider panel probes
        for index in 0..descriptor.parameter_count() + 1 {
            let value = descriptor.parameter(index);
            if let Some(spec) = descriptor.spec(index) {
                match spec.kind {
                    photofe::ParameterKind::Scalar => {
                        assert!(value >= spec.min && value <= spec.max);
                    }
                    photofe::ParameterKind::Color => {
                        assert_eq!(value, PARAMETER_NOT_SET);
                        assert!(descriptor.color_parameter(index).is_some());
                    }
                }
            } else {
                assert_eq!(value, PARAMETER_NOT_SET);
            }
        }
    }
}

#[test]
fn blend_filters_demand_a_second_input() {
    let mut catalog = catalog();
    let source = TestPatternSource::new(64, 64);
    let image = source.current_image(None);

    let blend = catalog.descriptor("MultiplyBlend").expect("built-in");
    assert!(blend.is_blend());
    assert_eq!(blend.apply(&image, None), Err(FilterError::MissingSecondInput));

    let second = source.current_image(Some(Extent::new(64.0, 64.0)));
    let out = blend.apply(&image, Some(&second)).expect("blends");
    assert_eq!(out.dimensions(), (64, 64));
}

#[test]
fn preset_public_values_survive_the_remap() {
    let mut catalog = catalog();
    let preset = catalog.descriptor("Preset").expect("built-in");

    preset.set_parameter(0, 6400.0); // Kelvin, public range
    preset.set_parameter(1, -35.0); // tint, public ±100
    assert_eq!(preset.parameter(0), 6400.0);
    assert_eq!(preset.parameter(1), -35.0);

    // the projection into kernel units round-trips
    for index in 0..preset.parameter_count() {
        let public = preset.parameter(index);
        let internal = preset.to_internal(index, public);
        let back = preset.to_public(index, internal);
        assert!((back - public).abs() < 1e-2, "index {}: {} vs {}", index, public, back);
    }
}

#[test]
fn default_preset_is_a_near_identity() {
    let mut catalog = catalog();
    let source = TestPatternSource::new(96, 96);
    let image = source.current_image(None);
    let preset = catalog.descriptor("Preset").expect("built-in");
    let out = preset.apply(&image, None).expect("renders");
    for (a, b) in out.pixels().zip(image.pixels()) {
        for c in 0..4 {
            assert!((a.0[c] as i16 - b.0[c] as i16).abs() <= 2);
        }
    }
}

#[test]
fn gallery_pass_over_every_visible_filter() {
    let mut catalog = catalog();
    let source = TestPatternSource::new(48, 48);
    let image = source.current_image(None);
    let second = source.current_image(None);

    for category in Category::ALL {
        for key in catalog.visible_keys(category) {
            let descriptor = catalog.descriptor(&key).expect("listed key exists");
            let second_input = descriptor.is_blend().then_some(&second);
            let out = descriptor.apply(&image, second_input).unwrap_or_else(|e| {
                panic!("{} failed: {}", key, e);
            });
            assert_eq!(out.dimensions(), image.dimensions(), "{}", key);
        }
    }
}

#[test]
fn selection_drives_stale_result_drop() {
    // The renderer never cancels in-flight work; callers drop stale results
    // by key comparison.  Model that protocol against the catalog.
    let mut catalog = catalog();
    catalog.select(Category::VisualEffects, "Sepia");
    let requested_key = "Sepia".to_string();

    // a newer selection lands while "Sepia" is still rendering
    catalog.select(Category::VisualEffects, "Vignette");

    let (_, current) = catalog.selected();
    assert_ne!(current, requested_key, "stale result must be discarded");
}

// ---------------------------------------------------------------------------
//  GPU-backed tests (skip without an adapter)
// ---------------------------------------------------------------------------

fn gpu() -> Option<Arc<GpuContext>> {
    match GpuContext::new("low power") {
        Ok(ctx) => Some(Arc::new(ctx)),
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            None
        }
    }
}

#[test]
fn pool_hands_out_one_surface_per_key() {
    let Some(ctx) = gpu() else { return };
    let mut pool = RenderSurfacePool::new(ctx);

    let first = pool.acquire("Sepia", 256, 192).expect("allocates").serial();
    let again = pool.acquire("Sepia", 256, 192).expect("cached").serial();
    assert_eq!(first, again, "same key, same surface");

    // release keeps the allocation warm
    pool.release("Sepia");
    assert!(pool.is_released("Sepia"));
    let after_release = pool.acquire("Sepia", 256, 192).expect("still cached").serial();
    assert_eq!(first, after_release);
    assert!(!pool.is_released("Sepia"));

    let other = pool.acquire("Vignette", 256, 192).expect("allocates").serial();
    assert_ne!(first, other, "distinct keys, distinct surfaces");
    assert_eq!(pool.len(), 2);

    assert!(pool.evict("Sepia"));
    assert_eq!(pool.len(), 1);
}

#[test]
fn oversize_allocation_fails_recoverably() {
    let Some(ctx) = gpu() else { return };
    let max = ctx.max_texture_dim;
    let mut pool = RenderSurfacePool::new(ctx);
    let result = pool.acquire("Huge", max + 1, 16);
    assert!(result.is_err(), "oversize must fail, not panic");
    assert!(!pool.contains("Huge"));
}

#[test]
fn present_memoizes_placement_for_touch_mapping() {
    let Some(ctx) = gpu() else { return };
    let renderer = SurfaceRenderer::new(Arc::clone(&ctx));
    let mut pool = RenderSurfacePool::new(ctx);

    let source = TestPatternSource::new(1080, 1920); // portrait content
    let image = source.current_image(None);

    let surface = pool.acquire("Sepia", 1920, 1080).expect("allocates"); // landscape surface
    let placement = renderer.present(surface, &image).expect("presents");
    assert_eq!(placement.rotation, photofe::Rotation::Plus90);
    assert_eq!(surface.placement(), Some(placement));
    assert_eq!(surface.image_extent(), Some(Extent::new(1080.0, 1920.0)));

    // inverse mapping answers from the memoized placement
    let (ix, iy) = surface.view_to_image(200.0, 150.0, Extent::new(1080.0, 1920.0));
    let (vx, vy) = surface.image_to_view(ix, iy, Extent::new(1080.0, 1920.0));
    assert!((vx - 200.0).abs() <= 1.0 && (vy - 150.0).abs() <= 1.0);
}

#[test]
fn unrendered_surface_falls_back_to_default_extent() {
    let Some(ctx) = gpu() else { return };
    let mut pool = RenderSurfacePool::new(ctx);
    let surface = pool.acquire("Fresh", 400, 300).expect("allocates");
    assert!(surface.placement().is_none());
    // mapping works anyway, against the supplied default image size
    let (ix, iy) = surface.view_to_image(200.0, 150.0, Extent::new(800.0, 600.0));
    assert!(ix.is_finite() && iy.is_finite());
}
