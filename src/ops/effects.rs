// ============================================================================
// EFFECT OPERATIONS — visual effects and stylization
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::filter::descriptor::FilterOp;
use crate::filter::params::ParamValue;
use crate::ops::filters::gaussian_blur;
use crate::ops::{luminance, map_pixels, map_pixels_xy, scalar, smoothstep};

/// params: [intensity 0..1].  Classic sepia matrix, mixed over the original.
pub struct Sepia;

impl FilterOp for Sepia {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let intensity = scalar(params, 0, 1.0);
        map_pixels(image, move |r, g, b, a| {
            let sr = (0.393 * r + 0.769 * g + 0.189 * b).min(255.0);
            let sg = (0.349 * r + 0.686 * g + 0.168 * b).min(255.0);
            let sb = (0.272 * r + 0.534 * g + 0.131 * b).min(255.0);
            (
                r + (sr - r) * intensity,
                g + (sg - g) * intensity,
                b + (sb - b) * intensity,
                a,
            )
        })
    }
}

/// params: [start 0..1, end 0..1].  Radial darkening between the two radii
/// (normalized so 1.0 sits at the frame corners).
pub struct Vignette;

impl FilterOp for Vignette {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let start = scalar(params, 0, 0.3);
        let end = scalar(params, 1, 0.75).max(start + 1e-4);
        map_pixels_xy(image, move |r, g, b, a, nx, ny| {
            let dx = nx - 0.5;
            let dy = ny - 0.5;
            let d = (dx * dx + dy * dy).sqrt() / std::f32::consts::FRAC_1_SQRT_2;
            let k = 1.0 - smoothstep(start, end, d);
            (r * k, g * k, b * k, a)
        })
    }
}

/// params: [distance −0.3..0.3, slope −0.3..0.3].  Atmospheric haze ramp,
/// strongest at the top of the frame.
pub struct Haze;

impl FilterOp for Haze {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let distance = scalar(params, 0, 0.2);
        let slope = scalar(params, 1, 0.0);
        map_pixels_xy(image, move |r, g, b, a, _nx, ny| {
            let d = (distance + slope * ny).clamp(-0.9, 0.9);
            let denom = 1.0 - d;
            (
                ((r / 255.0 - d) / denom) * 255.0,
                ((g / 255.0 - d) / denom) * 255.0,
                ((b / 255.0 - d) / denom) * 255.0,
                a,
            )
        })
    }
}

/// params: [radius 0..20, intensity 0..1].  Blurred copy screened over the
/// original for a soft bloom.
pub struct Glow;

impl FilterOp for Glow {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let radius = scalar(params, 0, 6.0);
        let intensity = scalar(params, 1, 0.5);
        if radius <= 0.0 || intensity <= 0.0 {
            return image.clone();
        }
        let blurred = gaussian_blur(image, radius / 3.0);
        let w = image.width() as usize;
        let h = image.height() as usize;
        let stride = w * 4;
        let src_raw = image.as_raw();
        let blur_raw = blurred.as_raw();
        let mut dst_raw = vec![0u8; w * h * 4];

        dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
            for x in 0..w {
                let pi = x * 4;
                let si = y * stride + pi;
                for c in 0..3 {
                    let s = src_raw[si + c] as f32 / 255.0;
                    let bl = blur_raw[si + c] as f32 / 255.0;
                    let screen = 1.0 - (1.0 - s) * (1.0 - bl);
                    let v = s + (screen - s) * intensity;
                    row_out[pi + c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
                }
                row_out[pi + 3] = src_raw[si + 3];
            }
        });

        RgbaImage::from_raw(w as u32, h as u32, dst_raw).expect("buffer sized to extent")
    }
}

/// params: [intensity 0..4].  3×3 directional relief convolution around
/// mid-gray.
pub struct Emboss;

impl FilterOp for Emboss {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let intensity = scalar(params, 0, 1.0);
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return image.clone();
        }
        let src = image.as_raw();
        let stride = w as usize * 4;
        let mut dst_raw = vec![0u8; src.len()];

        dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
            for x in 0..w as usize {
                let sample = |dx: i32, dy: i32, c: usize| -> f32 {
                    let sx = (x as i32 + dx).clamp(0, w as i32 - 1) as usize;
                    let sy = (y as i32 + dy).clamp(0, h as i32 - 1) as usize;
                    src[sy * stride + sx * 4 + c] as f32
                };
                let pi = x * 4;
                for c in 0..3 {
                    // relief kernel: -2 on the upper-left, +2 on the lower-right
                    let v = (-2.0 * sample(-1, -1, c) - sample(0, -1, c) - sample(-1, 0, c)
                        + sample(1, 0, c)
                        + sample(0, 1, c)
                        + 2.0 * sample(1, 1, c))
                        * intensity
                        + 128.0;
                    row_out[pi + c] = v.round().clamp(0.0, 255.0) as u8;
                }
                row_out[pi + 3] = src[y * stride + pi + 3];
            }
        });

        RgbaImage::from_raw(w, h, dst_raw).expect("buffer sized to extent")
    }
}

// ---------------------------------------------------------------------------
//  Stylization
// ---------------------------------------------------------------------------

/// Sobel gradient magnitude at every pixel, on the 0..255 luminance scale.
fn sobel_magnitude(src: &RgbaImage) -> Vec<f32> {
    let (w, h) = src.dimensions();
    let raw = src.as_raw();
    let stride = w as usize * 4;
    let lum_at = |x: i32, y: i32| -> f32 {
        let sx = x.clamp(0, w as i32 - 1) as usize;
        let sy = y.clamp(0, h as i32 - 1) as usize;
        let i = sy * stride + sx * 4;
        luminance(raw[i] as f32, raw[i + 1] as f32, raw[i + 2] as f32)
    };
    let mut mag = vec![0.0f32; (w * h) as usize];
    mag.par_chunks_mut(w as usize).enumerate().for_each(|(y, row)| {
        let y = y as i32;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i32;
            let gx = -lum_at(x - 1, y - 1) - 2.0 * lum_at(x - 1, y) - lum_at(x - 1, y + 1)
                + lum_at(x + 1, y - 1)
                + 2.0 * lum_at(x + 1, y)
                + lum_at(x + 1, y + 1);
            let gy = -lum_at(x - 1, y - 1) - 2.0 * lum_at(x, y - 1) - lum_at(x + 1, y - 1)
                + lum_at(x - 1, y + 1)
                + 2.0 * lum_at(x, y + 1)
                + lum_at(x + 1, y + 1);
            *out = (gx * gx + gy * gy).sqrt();
        }
    });
    mag
}

/// params: [edge threshold 0..1, levels 2..24].  Posterized colour with
/// dark cartoon outlines where the gradient is strong.
pub struct Toon;

impl FilterOp for Toon {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let threshold = scalar(params, 0, 0.2) * 1020.0; // sobel magnitude scale
        let levels = scalar(params, 1, 10.0).round().max(2.0);
        let step = 255.0 / (levels - 1.0);
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return image.clone();
        }
        let mag = sobel_magnitude(image);
        let src_raw = image.as_raw();
        let stride = w as usize * 4;
        let mut dst_raw = vec![0u8; src_raw.len()];

        dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
            for x in 0..w as usize {
                let pi = x * 4;
                let si = y * stride + pi;
                let edge = mag[y * w as usize + x] >= threshold;
                for c in 0..3 {
                    let v = if edge {
                        0.0
                    } else {
                        (src_raw[si + c] as f32 / step).round() * step
                    };
                    row_out[pi + c] = v.round().clamp(0.0, 255.0) as u8;
                }
                row_out[pi + 3] = src_raw[si + 3];
            }
        });

        RgbaImage::from_raw(w, h, dst_raw).expect("buffer sized to extent")
    }
}

/// params: [edge strength 0..4].  Inverted edge map on white paper.
pub struct PencilSketch;

impl FilterOp for PencilSketch {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let strength = scalar(params, 0, 1.0);
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return image.clone();
        }
        let mag = sobel_magnitude(image);
        let src_raw = image.as_raw();
        let stride = w as usize * 4;
        let mut dst_raw = vec![0u8; src_raw.len()];

        dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
            for x in 0..w as usize {
                let pi = x * 4;
                let v = (255.0 - mag[y * w as usize + x] * strength * 0.25)
                    .round()
                    .clamp(0.0, 255.0) as u8;
                row_out[pi] = v;
                row_out[pi + 1] = v;
                row_out[pi + 2] = v;
                row_out[pi + 3] = src_raw[y * stride + pi + 3];
            }
        });

        RgbaImage::from_raw(w, h, dst_raw).expect("buffer sized to extent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn sepia_full_intensity_matches_matrix() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let mut op = Sepia;
        let out = op.apply(&[ParamValue::Scalar(1.0)], &img, None).get_pixel(0, 0).0;
        assert_eq!(out, [135, 120, 94, 255]);
    }

    #[test]
    fn sepia_zero_intensity_is_identity() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([10, 180, 60, 200]));
        let mut op = Sepia;
        let out = op.apply(&[ParamValue::Scalar(0.0)], &img, None);
        assert_eq!(out, img);
    }

    #[test]
    fn vignette_darkens_corners_not_center() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([200, 200, 200, 255]));
        let mut op = Vignette;
        let params = [ParamValue::Scalar(0.2), ParamValue::Scalar(0.6)];
        let out = op.apply(&params, &img, None);
        let center = out.get_pixel(32, 32).0[0];
        let corner = out.get_pixel(0, 0).0[0];
        assert!(center > 190, "center kept bright, got {}", center);
        assert!(corner < 60, "corner darkened, got {}", corner);
    }

    #[test]
    fn pencil_sketch_is_white_on_flat_input() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([90, 14, 200, 255]));
        let mut op = PencilSketch;
        let out = op.apply(&[ParamValue::Scalar(1.0)], &img, None);
        assert_eq!(out.get_pixel(4, 4).0, [255, 255, 255, 255]);
    }

    #[test]
    fn toon_outlines_strong_edges() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        for y in 0..8 {
            for x in 4..8 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let mut op = Toon;
        let params = [ParamValue::Scalar(0.2), ParamValue::Scalar(8.0)];
        let out = op.apply(&params, &img, None);
        // the column straddling the edge goes black
        assert_eq!(out.get_pixel(4, 4).0[0], 0);
        // far from the edge the flat region survives posterization
        assert_eq!(out.get_pixel(7, 4).0[0], 255);
    }
}
