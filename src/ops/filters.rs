// ============================================================================
// IMAGE FILTERS — blur, sharpen, quantization, pixel processing
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::filter::descriptor::FilterOp;
use crate::filter::params::ParamValue;
use crate::ops::{luminance, map_pixels, scalar};

// ---------------------------------------------------------------------------
//  Parallel separable Gaussian blur
// ---------------------------------------------------------------------------

/// Build a 1-D Gaussian kernel truncated at ceil(3*sigma).
fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let mut kernel = vec![0.0f32; len];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for (i, v) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        let e = (-x * x / s2).exp();
        *v = e;
        sum += e;
    }
    let inv = 1.0 / sum;
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Two-pass separable Gaussian blur, parallel by row.  Edge pixels clamp.
pub fn gaussian_blur(src: &RgbaImage, sigma: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 || sigma <= 0.0 {
        return src.clone();
    }

    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let src_raw = src.as_raw();

    let pixel_count = w * h * 4;
    let buf_in: Vec<f32> = src_raw.iter().map(|&b| b as f32).collect();

    // --- Horizontal pass ---
    let mut buf_h = vec![0.0f32; pixel_count];
    buf_h.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        let row_start = y * w * 4;
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize)
                    .clamp(0, w as isize - 1) as usize;
                let idx = row_start + sx * 4;
                for c in 0..4 {
                    acc[c] += buf_in[idx + c] * kv;
                }
            }
            let out_idx = x * 4;
            row_out[out_idx..out_idx + 4].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass ---
    let mut buf_v = vec![0.0f32; pixel_count];
    buf_v.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize)
                    .clamp(0, h as isize - 1) as usize;
                let idx = sy * w * 4 + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c] * kv;
                }
            }
            let out_idx = x * 4;
            row_out[out_idx..out_idx + 4].copy_from_slice(&acc);
        }
    });

    let dst_raw: Vec<u8> = buf_v.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect();
    RgbaImage::from_raw(w as u32, h as u32, dst_raw).expect("buffer sized to extent")
}

/// Unsharp mask: `result = original + amount * (original - blurred)`.
pub fn unsharp_mask(src: &RgbaImage, amount: f32, sigma: f32) -> RgbaImage {
    if amount <= 0.0 {
        return src.clone();
    }
    let blurred = gaussian_blur(src, sigma);
    let w = src.width() as usize;
    let h = src.height() as usize;
    let src_raw = src.as_raw();
    let blur_raw = blurred.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let pi = x * 4;
            let si = y * stride + pi;
            for c in 0..3 {
                let s = src_raw[si + c] as f32;
                let b = blur_raw[si + c] as f32;
                row_out[pi + c] = (s + amount * (s - b)).round().clamp(0.0, 255.0) as u8;
            }
            row_out[pi + 3] = src_raw[si + 3];
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).expect("buffer sized to extent")
}

// ---------------------------------------------------------------------------
//  FilterOp wrappers
// ---------------------------------------------------------------------------

/// params: [sigma 0..24]
pub struct GaussianBlur;

impl FilterOp for GaussianBlur {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        gaussian_blur(image, scalar(params, 0, 2.0))
    }
}

/// params: [amount 0..4, sigma 0..10]
pub struct Sharpen;

impl FilterOp for Sharpen {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        unsharp_mask(image, scalar(params, 0, 1.0), scalar(params, 1, 2.0))
    }
}

/// BT.709 luminance desaturation.  No parameters.
pub struct Grayscale;

impl FilterOp for Grayscale {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let _ = params;
        map_pixels(image, |r, g, b, a| {
            let lum = luminance(r, g, b);
            (lum, lum, lum, a)
        })
    }
}

/// Negative image.  No parameters.
pub struct Invert;

impl FilterOp for Invert {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let _ = params;
        map_pixels(image, |r, g, b, a| (255.0 - r, 255.0 - g, 255.0 - b, a))
    }
}

/// params: [levels 2..256]
pub struct Posterize;

impl FilterOp for Posterize {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let levels = scalar(params, 0, 10.0).round().max(2.0);
        let step = 255.0 / (levels - 1.0);
        map_pixels(image, move |r, g, b, a| {
            (
                (r / step).round() * step,
                (g / step).round() * step,
                (b / step).round() * step,
                a,
            )
        })
    }
}

/// params: [threshold 0..1].  Hard black/white split on luminance.
pub struct LuminanceThreshold;

impl FilterOp for LuminanceThreshold {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let threshold = scalar(params, 0, 0.5) * 255.0;
        map_pixels(image, move |r, g, b, a| {
            let v = if luminance(r, g, b) >= threshold { 255.0 } else { 0.0 };
            (v, v, v, a)
        })
    }
}

/// params: [block size 1..64, pixels].  Block-average mosaic.
pub struct Pixelate;

impl FilterOp for Pixelate {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let block = scalar(params, 0, 8.0).round().max(1.0) as u32;
        pixelate(image, block)
    }
}

fn pixelate(src: &RgbaImage, block: u32) -> RgbaImage {
    let (w, h) = src.dimensions();
    if block <= 1 || w == 0 || h == 0 {
        return src.clone();
    }
    let mut out = RgbaImage::new(w, h);
    for by in (0..h).step_by(block as usize) {
        for bx in (0..w).step_by(block as usize) {
            let bw = block.min(w - bx);
            let bh = block.min(h - by);
            let mut acc = [0u64; 4];
            for y in by..by + bh {
                for x in bx..bx + bw {
                    let p = src.get_pixel(x, y).0;
                    for c in 0..4 {
                        acc[c] += p[c] as u64;
                    }
                }
            }
            let n = (bw * bh) as u64;
            let avg = [
                (acc[0] / n) as u8,
                (acc[1] / n) as u8,
                (acc[2] / n) as u8,
                (acc[3] / n) as u8,
            ];
            for y in by..by + bh {
                for x in bx..bx + bw {
                    out.put_pixel(x, y, image::Rgba(avg));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn blur_of_flat_image_is_identity() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([80, 120, 160, 255]));
        let out = gaussian_blur(&img, 3.0);
        assert_eq!(out.get_pixel(8, 8).0, [80, 120, 160, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [80, 120, 160, 255]);
    }

    #[test]
    fn blur_softens_an_edge() {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        for y in 0..16 {
            for x in 8..16 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let out = gaussian_blur(&img, 2.0);
        let mid = out.get_pixel(8, 8).0[0];
        assert!(mid > 30 && mid < 225, "edge should be smoothed, got {}", mid);
    }

    #[test]
    fn zero_sigma_is_identity() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([9, 8, 7, 6]));
        assert_eq!(gaussian_blur(&img, 0.0), img);
    }

    #[test]
    fn invert_is_its_own_inverse() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([12, 200, 77, 190]));
        let mut op = Invert;
        let once = op.apply(&[], &img, None);
        let twice = op.apply(&[], &once, None);
        assert_eq!(twice, img);
    }

    #[test]
    fn threshold_splits_on_luminance() {
        let mut op = LuminanceThreshold;
        let params = [ParamValue::Scalar(0.5)];
        let dark = RgbaImage::from_pixel(1, 1, Rgba([30, 30, 30, 255]));
        let light = RgbaImage::from_pixel(1, 1, Rgba([220, 220, 220, 255]));
        assert_eq!(op.apply(&params, &dark, None).get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(op.apply(&params, &light, None).get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn pixelate_averages_blocks() {
        let mut img = RgbaImage::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                let v = if x < 2 { 0 } else { 200 };
                img.put_pixel(x, y, Rgba([v, v, v, 255]));
            }
        }
        let mut op = Pixelate;
        let out = op.apply(&[ParamValue::Scalar(4.0)], &img, None);
        // one 4x4 block: average of half 0, half 200
        assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100, 255]);
        assert_eq!(out.get_pixel(3, 3).0, [100, 100, 100, 255]);
    }
}
