// ============================================================================
// ADJUSTMENT OPERATIONS — tonal and colour adjustments
// ============================================================================
//
// Parameter vectors arrive from the descriptor layer already clamped and,
// for the Preset pipeline, already projected into internal units.
// ============================================================================

use image::RgbaImage;

use crate::filter::descriptor::FilterOp;
use crate::filter::params::ParamValue;
use crate::ops::{color, hsl_to_rgb, luminance, map_pixels, map_pixels_xy, rgb_to_hsl, scalar, smoothstep};

// ---------------------------------------------------------------------------
//  Basic tonal adjustments
// ---------------------------------------------------------------------------

/// params: [amount −100..100]
pub struct Brightness;

impl FilterOp for Brightness {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let offset = scalar(params, 0, 0.0) * 1.28; // ±100 → ±128 levels
        map_pixels(image, move |r, g, b, a| (r + offset, g + offset, b + offset, a))
    }
}

/// params: [amount −100..100]
pub struct Contrast;

impl FilterOp for Contrast {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let c = scalar(params, 0, 0.0) * 2.55; // ±100 → ±255
        let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
        map_pixels(image, move |r, g, b, a| {
            (
                factor * (r - 128.0) + 128.0,
                factor * (g - 128.0) + 128.0,
                factor * (b - 128.0) + 128.0,
                a,
            )
        })
    }
}

/// params: [ev −4..4].  Simple gain of 2^ev.
pub struct Exposure;

impl FilterOp for Exposure {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let gain = 2.0f32.powf(scalar(params, 0, 0.0));
        map_pixels(image, move |r, g, b, a| (r * gain, g * gain, b * gain, a))
    }
}

/// params: [gamma 0.1..3.0]
pub struct Gamma;

impl FilterOp for Gamma {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let gamma = scalar(params, 0, 1.0).max(0.01);
        let inv = 1.0 / gamma;
        map_pixels(image, move |r, g, b, a| {
            (
                (r / 255.0).powf(inv) * 255.0,
                (g / 255.0).powf(inv) * 255.0,
                (b / 255.0).powf(inv) * 255.0,
                a,
            )
        })
    }
}

/// params: [factor 0..2, 1 = unchanged]
pub struct Saturation;

impl FilterOp for Saturation {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let factor = scalar(params, 0, 1.0);
        map_pixels(image, move |r, g, b, a| {
            let (h, s, l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);
            let (nr, ng, nb) = hsl_to_rgb(h, (s * factor).clamp(0.0, 1.0), l);
            (nr * 255.0, ng * 255.0, nb * 255.0, a)
        })
    }
}

/// params: [vibrance −1.2..1.2].  Saturation boost weighted toward the
/// least-saturated pixels, so skin tones survive.
pub struct Vibrance;

impl FilterOp for Vibrance {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let vibrance = scalar(params, 0, 0.0);
        map_pixels(image, move |r, g, b, a| vibrance_pixel(r, g, b, a, vibrance))
    }
}

fn vibrance_pixel(r: f32, g: f32, b: f32, a: f32, vibrance: f32) -> (f32, f32, f32, f32) {
    let average = (r + g + b) / 3.0;
    let mx = r.max(g).max(b);
    let amt = (mx - average) / 255.0 * (-vibrance * 3.0);
    (
        r + (mx - r) * amt,
        g + (mx - g) * amt,
        b + (mx - b) * amt,
        a,
    )
}

/// params: [hue −180..180, saturation −100..100, lightness −100..100]
pub struct HslAdjust;

impl FilterOp for HslAdjust {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let hue_shift = scalar(params, 0, 0.0);
        let sat_factor = 1.0 + scalar(params, 1, 0.0) / 100.0;
        let light_offset = scalar(params, 2, 0.0) * 255.0 / 100.0;
        map_pixels(image, move |r, g, b, a| {
            let (h, s, l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);
            let nh = (h + hue_shift / 360.0).rem_euclid(1.0);
            let ns = (s * sat_factor).clamp(0.0, 1.0);
            let (nr, ng, nb) = hsl_to_rgb(nh, ns, l);
            (
                nr * 255.0 + light_offset,
                ng * 255.0 + light_offset,
                nb * 255.0 + light_offset,
                a,
            )
        })
    }
}

/// params: [temperature 2500..7500 K, tint −200..200]
pub struct WhiteBalance;

impl FilterOp for WhiteBalance {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let temperature = scalar(params, 0, 5000.0);
        let tint = scalar(params, 1, 0.0);
        map_pixels(image, move |r, g, b, a| {
            white_balance_pixel(r, g, b, a, temperature, tint)
        })
    }
}

fn white_balance_pixel(r: f32, g: f32, b: f32, a: f32, temperature: f32, tint: f32) -> (f32, f32, f32, f32) {
    // 5000 K is neutral; normalize the Kelvin offset onto a ±100 scale.
    let temp_shift = (temperature - 5000.0) / 25.0 * 1.5;
    let tint_shift = tint / 2.0;
    (
        r + temp_shift,       // warm adds red
        g - tint_shift * 0.5, // tint trades green against magenta
        b - temp_shift,       // warm removes blue
        a,
    )
}

/// params: [colour, intensity 0..1].  Luminance tinted by the colour, mixed
/// back over the original.
pub struct Monochrome;

impl FilterOp for Monochrome {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let tint = color(params, 0);
        let intensity = scalar(params, 1, 1.0);
        map_pixels(image, move |r, g, b, a| {
            let lum = luminance(r, g, b);
            let mr = lum * tint.r;
            let mg = lum * tint.g;
            let mb = lum * tint.b;
            (
                r + (mr - r) * intensity,
                g + (mg - g) * intensity,
                b + (mb - b) * intensity,
                a,
            )
        })
    }
}

/// params: [shadow colour, highlight colour].  Luminance ramp between the
/// two colours.
pub struct FalseColor;

impl FilterOp for FalseColor {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let dark = color(params, 0);
        let light = color(params, 1);
        map_pixels(image, move |r, g, b, a| {
            let t = luminance(r, g, b) / 255.0;
            (
                (dark.r + (light.r - dark.r) * t) * 255.0,
                (dark.g + (light.g - dark.g) * t) * 255.0,
                (dark.b + (light.b - dark.b) * t) * 255.0,
                a,
            )
        })
    }
}

// ---------------------------------------------------------------------------
//  Preset pipeline
// ---------------------------------------------------------------------------

/// The Lightroom-style preset: one pass through the whole develop stack.
///
/// params (internal units, remapped by the descriptor from the public
/// slider ranges):
///   0 temperature 2500..7500   1 tint −200..200     2 exposure −4..4
///   3 contrast 0..4 (2 = flat) 4 highlights 0..1    5 shadows 0..1
///   6 vibrance −1.2..1.2       7 saturation 0..2    8 sharpness 0..1
///   9 vignette start 0..1     10 vignette end 0..1
///
/// Neutral is the midpoint of symmetric ranges and zero elsewhere, so a
/// public slider at its initial position leaves the image untouched.
pub struct Preset;

impl FilterOp for Preset {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, _second: Option<&RgbaImage>) -> RgbaImage {
        let temperature = scalar(params, 0, 5000.0);
        let tint = scalar(params, 1, 0.0);
        let gain = 2.0f32.powf(scalar(params, 2, 0.0));
        let contrast = scalar(params, 3, 2.0) / 2.0; // internal 2.0 = flat
        let highlight_amt = -scalar(params, 4, 0.0); // recovery darkens highlights
        let shadow_amt = scalar(params, 5, 0.0);
        let vibrance = scalar(params, 6, 0.0);
        let sat_factor = scalar(params, 7, 1.0);
        let sharpness = scalar(params, 8, 0.0);
        let vig_start = scalar(params, 9, 1.0);
        let vig_end = scalar(params, 10, 1.0);

        let mut out = map_pixels(image, move |r, g, b, a| {
            let (mut r, mut g, mut b, a) = white_balance_pixel(r, g, b, a, temperature, tint);
            r *= gain;
            g *= gain;
            b *= gain;
            r = (r - 128.0) * contrast + 128.0;
            g = (g - 128.0) * contrast + 128.0;
            b = (b - 128.0) * contrast + 128.0;

            // shadow lift / highlight recovery, weighted by luminance
            let lum = (luminance(r, g, b) / 255.0).clamp(0.0, 1.0);
            let sw = (1.0 - lum).powi(2);
            let hw = lum.powi(2);
            let tone = sw * shadow_amt * 128.0 + hw * highlight_amt * 128.0;
            r += tone;
            g += tone;
            b += tone;

            let (r, g, b, a) = vibrance_pixel(r, g, b, a, vibrance);

            if (sat_factor - 1.0).abs() > 1e-3 {
                let (h, s, l) = rgb_to_hsl(
                    (r / 255.0).clamp(0.0, 1.0),
                    (g / 255.0).clamp(0.0, 1.0),
                    (b / 255.0).clamp(0.0, 1.0),
                );
                let (nr, ng, nb) = hsl_to_rgb(h, (s * sat_factor).clamp(0.0, 1.0), l);
                (nr * 255.0, ng * 255.0, nb * 255.0, a)
            } else {
                (r, g, b, a)
            }
        });

        if sharpness > 0.01 {
            out = crate::ops::filters::unsharp_mask(&out, sharpness * 2.0, 1.5);
        }

        // vignette; start == end == 1.0 means fully outside the frame
        if vig_start < 0.999 || vig_end < 0.999 {
            out = map_pixels_xy(&out, move |r, g, b, a, nx, ny| {
                let dx = nx - 0.5;
                let dy = ny - 0.5;
                let d = (dx * dx + dy * dy).sqrt() / std::f32::consts::FRAC_1_SQRT_2;
                let percent = smoothstep(vig_start, vig_end.max(vig_start + 1e-4), d);
                let k = 1.0 - percent;
                (r * k, g * k, b * k, a)
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn px(op: &mut dyn FilterOp, params: &[ParamValue], pixel: [u8; 4]) -> [u8; 4] {
        let img = RgbaImage::from_pixel(2, 2, Rgba(pixel));
        op.apply(params, &img, None).get_pixel(0, 0).0
    }

    #[test]
    fn brightness_shifts_all_channels() {
        let out = px(&mut Brightness, &[ParamValue::Scalar(50.0)], [100, 100, 100, 255]);
        assert_eq!(out, [164, 164, 164, 255]);
    }

    #[test]
    fn zero_contrast_is_identity() {
        let out = px(&mut Contrast, &[ParamValue::Scalar(0.0)], [37, 99, 240, 200]);
        assert_eq!(out, [37, 99, 240, 200]);
    }

    #[test]
    fn exposure_doubles_per_stop() {
        let out = px(&mut Exposure, &[ParamValue::Scalar(1.0)], [40, 60, 80, 255]);
        assert_eq!(out, [80, 120, 160, 255]);
    }

    #[test]
    fn neutral_white_balance_is_identity() {
        let params = [ParamValue::Scalar(5000.0), ParamValue::Scalar(0.0)];
        let out = px(&mut WhiteBalance, &params, [12, 200, 90, 255]);
        assert_eq!(out, [12, 200, 90, 255]);
    }

    #[test]
    fn warm_temperature_adds_red_removes_blue() {
        let params = [ParamValue::Scalar(6000.0), ParamValue::Scalar(0.0)];
        let out = px(&mut WhiteBalance, &params, [100, 100, 100, 255]);
        assert!(out[0] > 100 && out[2] < 100 && out[1] == 100);
    }

    #[test]
    fn saturation_zero_desaturates() {
        let out = px(&mut Saturation, &[ParamValue::Scalar(0.0)], [200, 40, 40, 255]);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }

    #[test]
    fn neutral_preset_is_near_identity() {
        // internal neutral values per the develop-stack documentation
        let params = [
            ParamValue::Scalar(5000.0), // temperature
            ParamValue::Scalar(0.0),    // tint
            ParamValue::Scalar(0.0),    // exposure
            ParamValue::Scalar(2.0),    // contrast (midpoint = flat)
            ParamValue::Scalar(0.0),    // highlights
            ParamValue::Scalar(0.0),    // shadows
            ParamValue::Scalar(0.0),    // vibrance
            ParamValue::Scalar(1.0),    // saturation
            ParamValue::Scalar(0.0),    // sharpness
            ParamValue::Scalar(1.0),    // vignette start
            ParamValue::Scalar(1.0),    // vignette end
        ];
        let out = px(&mut Preset, &params, [90, 140, 210, 255]);
        for (o, e) in out.iter().zip([90u8, 140, 210, 255]) {
            assert!((*o as i16 - e as i16).abs() <= 2, "{:?}", out);
        }
    }
}
