// ============================================================================
// OPS MODULE — the pixel kernels behind the filter descriptors
// ============================================================================
//
// Architecture:
//   adjustments.rs — tonal/colour adjustments (brightness … preset pipeline)
//   filters.rs     — convolution-style processing (blur, sharpen, posterize)
//   effects.rs     — visual effects and stylization (sepia, vignette, toon)
//   blends.rs      — two-input blend operations
//
// All kernels are CPU-side, rayon-parallel by row, and operate on 8-bit RGBA
// with intermediate math in f32.  Every kernel is wrapped in a small struct
// implementing `FilterOp` so the descriptor layer can drive it generically.
// ============================================================================

pub mod adjustments;
pub mod blends;
pub mod effects;
pub mod filters;

use image::RgbaImage;
use rayon::prelude::*;

use crate::filter::params::{ParamValue, Rgba};

/// Scalar parameter lookup with a default for missing/mismatched entries.
/// The descriptor clamps and type-checks writes, so the default only shows
/// up for hand-built parameter vectors in tests.
pub(crate) fn scalar(params: &[ParamValue], index: usize, default: f32) -> f32 {
    params.get(index).and_then(|p| p.as_scalar()).unwrap_or(default)
}

/// Colour parameter lookup, defaulting to opaque black.
pub(crate) fn color(params: &[ParamValue], index: usize) -> Rgba {
    params.get(index).and_then(|p| p.as_color()).unwrap_or(Rgba::BLACK)
}

/// BT.709 luminance on 0..255-scale channels.
pub(crate) fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if (edge1 - edge0).abs() < f32::EPSILON {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Apply a per-pixel transform to the whole image, parallel by row.
/// `f` receives and returns (r, g, b, a) on the 0..255 scale; outputs are
/// rounded and clamped back to u8.
pub(crate) fn map_pixels<F>(src: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }
    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let (nr, ng, nb, na) = f(
                row_in[pi] as f32,
                row_in[pi + 1] as f32,
                row_in[pi + 2] as f32,
                row_in[pi + 3] as f32,
            );
            row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).expect("buffer sized to extent")
}

/// Position-aware variant: `f` additionally receives the pixel position
/// normalized to `0..=1` in both axes (y measured top-down, matching the
/// bitmap's row order).  Used by radial and gradient effects.
pub(crate) fn map_pixels_xy<F>(src: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }
    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];
    let inv_w = 1.0 / (w.max(1) as f32);
    let inv_h = 1.0 / (h.max(1) as f32);

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        let ny = (y as f32 + 0.5) * inv_h;
        for x in 0..w {
            let pi = x * 4;
            let nx = (x as f32 + 0.5) * inv_w;
            let (nr, ng, nb, na) = f(
                row_in[pi] as f32,
                row_in[pi + 1] as f32,
                row_in[pi + 2] as f32,
                row_in[pi + 3] as f32,
                nx,
                ny,
            );
            row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).expect("buffer sized to extent")
}

// ---------------------------------------------------------------------------
//  Colour space helpers
// ---------------------------------------------------------------------------

/// RGB (0..1) → HSL (all 0..1).
pub(crate) fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let mx = r.max(g).max(b);
    let mn = r.min(g).min(b);
    let l = (mx + mn) / 2.0;
    if (mx - mn).abs() < f32::EPSILON {
        return (0.0, 0.0, l);
    }
    let d = mx - mn;
    let s = if l > 0.5 { d / (2.0 - mx - mn) } else { d / (mx + mn) };
    let h = if mx == r {
        ((g - b) / d + if g < b { 6.0 } else { 0.0 }) / 6.0
    } else if mx == g {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };
    (h, s, l)
}

/// HSL (all 0..1) → RGB (0..1).
pub(crate) fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s.abs() < f32::EPSILON {
        return (l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_round_trip() {
        for &(r, g, b) in &[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0), (0.8, 0.2, 0.4), (0.1, 0.9, 0.5)] {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            let (r2, g2, b2) = hsl_to_rgb(h, s, l);
            assert!((r - r2).abs() < 1e-4);
            assert!((g - g2).abs() < 1e-4);
            assert!((b - b2).abs() < 1e-4);
        }
    }

    #[test]
    fn map_pixels_preserves_extent_and_alpha() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([100, 150, 200, 128]));
        let out = map_pixels(&img, |r, g, b, a| (r + 10.0, g, b, a));
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.get_pixel(2, 1).0, [110, 150, 200, 128]);
    }

    #[test]
    fn map_pixels_clamps_output() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([250, 5, 0, 255]));
        let out = map_pixels(&img, |r, g, b, a| (r + 50.0, g - 50.0, b, a));
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
