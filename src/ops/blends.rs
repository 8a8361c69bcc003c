// ============================================================================
// BLEND OPERATIONS — two-input filters
// ============================================================================
//
// Every blend op requires a second input; the descriptor layer enforces
// that before the kernel runs.  The second image is sampled at the same
// pixel position, clamped to its own bounds when the extents differ (the
// caller is expected to pre-size blend sources, this is just the safety
// net).
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::filter::descriptor::FilterOp;
use crate::filter::params::ParamValue;
use crate::ops::scalar;

/// Per-pixel combine rule on normalized channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    Difference,
    Add,
}

impl BlendMode {
    fn combine(self, base: f32, top: f32) -> f32 {
        match self {
            BlendMode::Normal => top,
            BlendMode::Multiply => base * top,
            BlendMode::Screen => 1.0 - (1.0 - base) * (1.0 - top),
            BlendMode::Overlay => {
                if base < 0.5 {
                    2.0 * base * top
                } else {
                    1.0 - 2.0 * (1.0 - base) * (1.0 - top)
                }
            }
            BlendMode::Darken => base.min(top),
            BlendMode::Lighten => base.max(top),
            BlendMode::Difference => (base - top).abs(),
            BlendMode::Add => (base + top).min(1.0),
        }
    }
}

/// params: [opacity 0..1].  Combines the second input over the first with
/// the configured mode, attenuated by opacity and the top pixel's alpha.
pub struct Blend {
    mode: BlendMode,
}

impl Blend {
    pub fn new(mode: BlendMode) -> Self {
        Self { mode }
    }
}

impl FilterOp for Blend {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, second: Option<&RgbaImage>) -> RgbaImage {
        let Some(top_img) = second else {
            // Descriptor precondition keeps this unreachable in practice.
            return image.clone();
        };
        let opacity = scalar(params, 0, 1.0);
        let mode = self.mode;

        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return image.clone();
        }
        let (tw, th) = top_img.dimensions();
        if tw == 0 || th == 0 {
            return image.clone();
        }

        let base_raw = image.as_raw();
        let top_raw = top_img.as_raw();
        let stride = w as usize * 4;
        let top_stride = tw as usize * 4;
        let mut dst_raw = vec![0u8; base_raw.len()];

        dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
            let ty = (y as u32).min(th - 1) as usize;
            for x in 0..w as usize {
                let tx = (x as u32).min(tw - 1) as usize;
                let bi = y * stride + x * 4;
                let ti = ty * top_stride + tx * 4;

                let top_a = top_raw[ti + 3] as f32 / 255.0;
                let weight = opacity * top_a;
                for c in 0..3 {
                    let base = base_raw[bi + c] as f32 / 255.0;
                    let top = top_raw[ti + c] as f32 / 255.0;
                    let blended = mode.combine(base, top);
                    let v = base + (blended - base) * weight;
                    row_out[x * 4 + c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
                }
                row_out[x * 4 + 3] = base_raw[bi + 3];
            }
        });

        RgbaImage::from_raw(w, h, dst_raw).expect("buffer sized to extent")
    }
}

// Builders referenced by the filter library table.

pub fn normal() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Normal))
}

pub fn multiply() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Multiply))
}

pub fn screen() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Screen))
}

pub fn overlay() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Overlay))
}

pub fn darken() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Darken))
}

pub fn lighten() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Lighten))
}

pub fn difference() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Difference))
}

pub fn add() -> Box<dyn FilterOp> {
    Box::new(Blend::new(BlendMode::Add))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(v: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba(v))
    }

    #[test]
    fn multiply_darkens() {
        let mut op = Blend::new(BlendMode::Multiply);
        let out = op.apply(
            &[ParamValue::Scalar(1.0)],
            &solid([128, 128, 128, 255]),
            Some(&solid([128, 128, 128, 255])),
        );
        let v = out.get_pixel(0, 0).0[0];
        assert!((v as i16 - 64).abs() <= 1, "multiply of mid-gray ≈ 64, got {}", v);
    }

    #[test]
    fn screen_lightens() {
        let mut op = Blend::new(BlendMode::Screen);
        let out = op.apply(
            &[ParamValue::Scalar(1.0)],
            &solid([128, 128, 128, 255]),
            Some(&solid([128, 128, 128, 255])),
        );
        let v = out.get_pixel(0, 0).0[0];
        assert!((v as i16 - 191).abs() <= 1, "screen of mid-gray ≈ 191, got {}", v);
    }

    #[test]
    fn zero_opacity_keeps_base() {
        let mut op = Blend::new(BlendMode::Normal);
        let base = solid([10, 20, 30, 255]);
        let out = op.apply(&[ParamValue::Scalar(0.0)], &base, Some(&solid([200, 200, 200, 255])));
        assert_eq!(out, base);
    }

    #[test]
    fn mismatched_extents_clamp_instead_of_panicking() {
        let mut op = Blend::new(BlendMode::Add);
        let base = RgbaImage::from_pixel(4, 4, Rgba([10, 10, 10, 255]));
        let top = RgbaImage::from_pixel(2, 2, Rgba([10, 10, 10, 255]));
        let out = op.apply(&[ParamValue::Scalar(1.0)], &base, Some(&top));
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(3, 3).0, [20, 20, 20, 255]);
    }
}
