// ============================================================================
// FILTER LIBRARY — the built-in filter definitions, one table
// ============================================================================
//
// Each row names a filter key, its gallery category, its parameter table
// and the kernel that runs it.  Everything the catalog needs to build a
// descriptor lazily lives here; adding a filter is adding a row.
//
// Quick Select entries are curated one-tap looks: the same kernels as the
// adjustment filters, shipped with opinionated initial values.
// ============================================================================

use crate::catalog::Category;
use crate::filter::descriptor::{FilterDescriptor, OpBuilder};
use crate::filter::params::{ParamRange, ParameterSpec};
use crate::ops::{adjustments, blends, effects, filters};

/// Everything needed to instantiate one filter descriptor on demand.
#[derive(Clone)]
pub struct FilterDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub is_blend: bool,
    pub params: fn() -> Vec<ParameterSpec>,
    /// Derived-range table for the Preset family (parallel to `params`).
    pub internal_ranges: Option<fn() -> Vec<ParamRange>>,
    pub build_op: OpBuilder,
}

impl FilterDefinition {
    pub fn instantiate(&self) -> FilterDescriptor {
        FilterDescriptor::new(
            self.key,
            self.title,
            self.category,
            self.is_blend,
            (self.params)(),
            self.internal_ranges.map(|ranges| ranges()),
            self.build_op,
        )
    }
}

fn no_params() -> Vec<ParameterSpec> {
    Vec::new()
}

macro_rules! op {
    ($ty:path) => {
        || Box::new($ty) as Box<dyn crate::filter::descriptor::FilterOp>
    };
}

/// The complete built-in set.
pub fn builtin_definitions() -> Vec<FilterDefinition> {
    let mut defs: Vec<FilterDefinition> = Vec::new();

    // ------------------------------------------------------------------
    //  Quick Select
    // ------------------------------------------------------------------
    defs.push(FilterDefinition {
        key: "Vivid",
        title: "Vivid",
        category: Category::QuickSelect,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("saturation", 0.0, 2.0, 1.4)],
        internal_ranges: None,
        build_op: op!(adjustments::Saturation),
    });
    defs.push(FilterDefinition {
        key: "Warmer",
        title: "Warmer",
        category: Category::QuickSelect,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("temperature", 2500.0, 7500.0, 6200.0),
                ParameterSpec::scalar("tint", -200.0, 200.0, 0.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(adjustments::WhiteBalance),
    });
    defs.push(FilterDefinition {
        key: "Cooler",
        title: "Cooler",
        category: Category::QuickSelect,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("temperature", 2500.0, 7500.0, 3800.0),
                ParameterSpec::scalar("tint", -200.0, 200.0, 0.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(adjustments::WhiteBalance),
    });
    defs.push(FilterDefinition {
        key: "Mono",
        title: "Mono",
        category: Category::QuickSelect,
        is_blend: false,
        params: no_params,
        internal_ranges: None,
        build_op: op!(filters::Grayscale),
    });
    defs.push(FilterDefinition {
        key: "Punch",
        title: "Punch",
        category: Category::QuickSelect,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("contrast", -100.0, 100.0, 25.0)],
        internal_ranges: None,
        build_op: op!(adjustments::Contrast),
    });
    defs.push(FilterDefinition {
        key: "Dreamy",
        title: "Dreamy",
        category: Category::QuickSelect,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("radius", 0.0, 20.0, 10.0),
                ParameterSpec::scalar("intensity", 0.0, 1.0, 0.6),
            ]
        },
        internal_ranges: None,
        build_op: op!(effects::Glow),
    });

    // ------------------------------------------------------------------
    //  Color Adjustments
    // ------------------------------------------------------------------
    defs.push(FilterDefinition {
        key: "Brightness",
        title: "Brightness",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("amount", -100.0, 100.0, 0.0)],
        internal_ranges: None,
        build_op: op!(adjustments::Brightness),
    });
    defs.push(FilterDefinition {
        key: "Contrast",
        title: "Contrast",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("amount", -100.0, 100.0, 0.0)],
        internal_ranges: None,
        build_op: op!(adjustments::Contrast),
    });
    defs.push(FilterDefinition {
        key: "Exposure",
        title: "Exposure",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("ev", -4.0, 4.0, 0.0)],
        internal_ranges: None,
        build_op: op!(adjustments::Exposure),
    });
    defs.push(FilterDefinition {
        key: "Gamma",
        title: "Gamma",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("gamma", 0.1, 3.0, 1.0)],
        internal_ranges: None,
        build_op: op!(adjustments::Gamma),
    });
    defs.push(FilterDefinition {
        key: "Saturation",
        title: "Saturation",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("saturation", 0.0, 2.0, 1.0)],
        internal_ranges: None,
        build_op: op!(adjustments::Saturation),
    });
    defs.push(FilterDefinition {
        key: "Vibrance",
        title: "Vibrance",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("vibrance", -1.2, 1.2, 0.0)],
        internal_ranges: None,
        build_op: op!(adjustments::Vibrance),
    });
    defs.push(FilterDefinition {
        key: "HSL",
        title: "Hue / Saturation / Lightness",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("hue", -180.0, 180.0, 0.0),
                ParameterSpec::scalar("saturation", -100.0, 100.0, 0.0),
                ParameterSpec::scalar("lightness", -100.0, 100.0, 0.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(adjustments::HslAdjust),
    });
    defs.push(FilterDefinition {
        key: "WhiteBalance",
        title: "White Balance",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("temperature", 2500.0, 7500.0, 5000.0),
                ParameterSpec::scalar("tint", -200.0, 200.0, 0.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(adjustments::WhiteBalance),
    });
    defs.push(FilterDefinition {
        key: "Monochrome",
        title: "Monochrome",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::color("tint colour"),
                ParameterSpec::scalar("intensity", 0.0, 1.0, 1.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(adjustments::Monochrome),
    });
    defs.push(FilterDefinition {
        key: "FalseColor",
        title: "False Color",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::color("shadow colour"),
                ParameterSpec::color("highlight colour"),
            ]
        },
        internal_ranges: None,
        build_op: op!(adjustments::FalseColor),
    });
    // The develop-stack preset exposes Lightroom-style public ranges that
    // project linearly onto the ranges the pipeline kernels consume.
    defs.push(FilterDefinition {
        key: "Preset",
        title: "Preset",
        category: Category::ColorAdjustments,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("temperature", 2500.0, 7500.0, 5000.0),
                ParameterSpec::scalar("tint", -100.0, 100.0, 0.0),
                ParameterSpec::scalar("exposure", -4.0, 4.0, 0.0),
                ParameterSpec::scalar("contrast", -100.0, 100.0, 0.0),
                ParameterSpec::scalar("highlights", 0.0, 100.0, 0.0),
                ParameterSpec::scalar("shadows", 0.0, 100.0, 0.0),
                ParameterSpec::scalar("vibrance", -100.0, 100.0, 0.0),
                ParameterSpec::scalar("saturation", -100.0, 100.0, 0.0),
                ParameterSpec::scalar("sharpness", 0.0, 100.0, 0.0),
                ParameterSpec::scalar("start", 0.0, 100.0, 100.0),
                ParameterSpec::scalar("end", 0.0, 100.0, 100.0),
            ]
        },
        internal_ranges: Some(|| {
            vec![
                ParamRange::new(2500.0, 7500.0),
                ParamRange::new(-200.0, 200.0),
                ParamRange::new(-4.0, 4.0),
                ParamRange::new(0.0, 4.0),
                ParamRange::new(0.0, 1.0),
                ParamRange::new(0.0, 1.0),
                ParamRange::new(-1.2, 1.2),
                ParamRange::new(0.0, 2.0),
                ParamRange::new(0.0, 1.0),
                ParamRange::new(0.0, 1.0),
                ParamRange::new(0.0, 1.0),
            ]
        }),
        build_op: op!(adjustments::Preset),
    });

    // ------------------------------------------------------------------
    //  Image Processing
    // ------------------------------------------------------------------
    defs.push(FilterDefinition {
        key: "GaussianBlur",
        title: "Gaussian Blur",
        category: Category::ImageProcessing,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("sigma", 0.0, 24.0, 2.0)],
        internal_ranges: None,
        build_op: op!(filters::GaussianBlur),
    });
    defs.push(FilterDefinition {
        key: "Sharpen",
        title: "Sharpen",
        category: Category::ImageProcessing,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("amount", 0.0, 4.0, 1.0),
                ParameterSpec::scalar("radius", 0.0, 10.0, 2.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(filters::Sharpen),
    });
    defs.push(FilterDefinition {
        key: "Grayscale",
        title: "Grayscale",
        category: Category::ImageProcessing,
        is_blend: false,
        params: no_params,
        internal_ranges: None,
        build_op: op!(filters::Grayscale),
    });
    defs.push(FilterDefinition {
        key: "Invert",
        title: "Invert",
        category: Category::ImageProcessing,
        is_blend: false,
        params: no_params,
        internal_ranges: None,
        build_op: op!(filters::Invert),
    });
    defs.push(FilterDefinition {
        key: "Posterize",
        title: "Posterize",
        category: Category::ImageProcessing,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("levels", 2.0, 256.0, 10.0)],
        internal_ranges: None,
        build_op: op!(filters::Posterize),
    });
    defs.push(FilterDefinition {
        key: "Threshold",
        title: "Luminance Threshold",
        category: Category::ImageProcessing,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("threshold", 0.0, 1.0, 0.5)],
        internal_ranges: None,
        build_op: op!(filters::LuminanceThreshold),
    });
    defs.push(FilterDefinition {
        key: "Pixelate",
        title: "Pixelate",
        category: Category::ImageProcessing,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("block size", 1.0, 64.0, 8.0)],
        internal_ranges: None,
        build_op: op!(filters::Pixelate),
    });

    // ------------------------------------------------------------------
    //  Blend Modes
    // ------------------------------------------------------------------
    let blend_modes: [(&'static str, &'static str, OpBuilder); 8] = [
        ("NormalBlend", "Normal", blends::normal),
        ("MultiplyBlend", "Multiply", blends::multiply),
        ("ScreenBlend", "Screen", blends::screen),
        ("OverlayBlend", "Overlay", blends::overlay),
        ("DarkenBlend", "Darken", blends::darken),
        ("LightenBlend", "Lighten", blends::lighten),
        ("DifferenceBlend", "Difference", blends::difference),
        ("AddBlend", "Add", blends::add),
    ];
    for (key, title, build_op) in blend_modes {
        defs.push(FilterDefinition {
            key,
            title,
            category: Category::BlendModes,
            is_blend: true,
            params: || vec![ParameterSpec::scalar("opacity", 0.0, 1.0, 1.0)],
            internal_ranges: None,
            build_op,
        });
    }

    // ------------------------------------------------------------------
    //  Visual Effects
    // ------------------------------------------------------------------
    defs.push(FilterDefinition {
        key: "Sepia",
        title: "Sepia",
        category: Category::VisualEffects,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("intensity", 0.0, 1.0, 1.0)],
        internal_ranges: None,
        build_op: op!(effects::Sepia),
    });
    defs.push(FilterDefinition {
        key: "Vignette",
        title: "Vignette",
        category: Category::VisualEffects,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("start", 0.0, 1.0, 0.3),
                ParameterSpec::scalar("end", 0.0, 1.0, 0.75),
            ]
        },
        internal_ranges: None,
        build_op: op!(effects::Vignette),
    });
    defs.push(FilterDefinition {
        key: "Haze",
        title: "Haze",
        category: Category::VisualEffects,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("distance", -0.3, 0.3, 0.2),
                ParameterSpec::scalar("slope", -0.3, 0.3, 0.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(effects::Haze),
    });
    defs.push(FilterDefinition {
        key: "Glow",
        title: "Glow",
        category: Category::VisualEffects,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("radius", 0.0, 20.0, 6.0),
                ParameterSpec::scalar("intensity", 0.0, 1.0, 0.5),
            ]
        },
        internal_ranges: None,
        build_op: op!(effects::Glow),
    });
    defs.push(FilterDefinition {
        key: "Emboss",
        title: "Emboss",
        category: Category::VisualEffects,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("intensity", 0.0, 4.0, 1.0)],
        internal_ranges: None,
        build_op: op!(effects::Emboss),
    });

    // ------------------------------------------------------------------
    //  Style
    // ------------------------------------------------------------------
    defs.push(FilterDefinition {
        key: "Toon",
        title: "Toon",
        category: Category::Style,
        is_blend: false,
        params: || {
            vec![
                ParameterSpec::scalar("edge threshold", 0.0, 1.0, 0.2),
                ParameterSpec::scalar("levels", 2.0, 24.0, 10.0),
            ]
        },
        internal_ranges: None,
        build_op: op!(effects::Toon),
    });
    defs.push(FilterDefinition {
        key: "PencilSketch",
        title: "Pencil Sketch",
        category: Category::Style,
        is_blend: false,
        params: || vec![ParameterSpec::scalar("edge strength", 0.0, 4.0, 1.0)],
        internal_ranges: None,
        build_op: op!(effects::PencilSketch),
    });

    defs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_definition_instantiates_cleanly() {
        for def in builtin_definitions() {
            let d = def.instantiate();
            assert_eq!(d.key(), def.key);
            assert_eq!(d.category(), def.category);
            assert_eq!(d.is_blend(), def.is_blend);
            assert_eq!(d.parameter_count(), (def.params)().len());
        }
    }

    #[test]
    fn blend_definitions_are_exactly_the_blend_category() {
        for def in builtin_definitions() {
            assert_eq!(def.is_blend, def.category == Category::BlendModes, "{}", def.key);
        }
    }

    #[test]
    fn preset_ranges_stay_parallel() {
        let def = builtin_definitions()
            .into_iter()
            .find(|d| d.key == "Preset")
            .expect("preset definition");
        let ranges = (def.internal_ranges.expect("derived ranges"))();
        assert_eq!(ranges.len(), (def.params)().len());
    }
}
