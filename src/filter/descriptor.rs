// ============================================================================
// FILTER DESCRIPTOR — bridge between UI machinery and one filter operation
// ============================================================================
//
// A descriptor wraps one pixel operation behind a uniform, index-driven
// parameter interface so galleries and slider panels can drive any filter
// without knowing what it is.  It owns two value vectors of identical shape:
// the live values the next `apply()` will see, and a stash taken before an
// interactive edit so a cancelled edit can be rolled back exactly.
// ============================================================================

use image::RgbaImage;
use thiserror::Error;

use crate::catalog::Category;
use crate::filter::params::{
    PARAMETER_NOT_SET, ParamRange, ParamValue, ParameterKind, ParameterSpec, Rgba, remap,
};
use crate::log_warn;

/// Errors surfaced by descriptor operations.
///
/// Index and kind problems never reach callers of the plain accessors (those
/// degrade to the sentinel / a logged no-op, because they happen mid-gesture
/// in slider UIs); they are observable through the `try_` variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("parameter index {0} is out of range")]
    InvalidIndex(usize),
    #[error("parameter index {0} has the wrong kind for this accessor")]
    KindMismatch(usize),
    #[error("blend filter applied without a second input image")]
    MissingSecondInput,
    #[error("input image has zero extent")]
    EmptyInput,
}

/// The underlying pixel operation a descriptor drives.
///
/// Implementations receive the resolved parameter vector (internal units,
/// already clamped) and must produce an output image of the same extent as
/// the input.  `apply` takes `&mut self` so an operation may keep scratch
/// state (cached kernels, lookup tables); `FilterDescriptor::reset` rebuilds
/// the instance to drop any such state.
pub trait FilterOp: Send {
    fn apply(&mut self, params: &[ParamValue], image: &RgbaImage, second: Option<&RgbaImage>)
    -> RgbaImage;
}

/// Constructor used to (re)build the underlying operation.
pub type OpBuilder = fn() -> Box<dyn FilterOp>;

pub struct FilterDescriptor {
    key: String,
    title: String,
    category: Category,
    is_blend: bool,
    specs: Vec<ParameterSpec>,
    /// Internal target ranges for the derived-range (Preset) family.  When
    /// present it has one entry per spec; the live vector stores values in
    /// the public range and `apply` remaps them on the way in.
    internal_ranges: Option<Vec<ParamRange>>,
    live: Vec<ParamValue>,
    stash: Vec<ParamValue>,
    op: Box<dyn FilterOp>,
    build_op: OpBuilder,
}

impl FilterDescriptor {
    /// Invariant: `live` and `stash` always have exactly one entry per spec.
    pub fn new(
        key: &str,
        title: &str,
        category: Category,
        is_blend: bool,
        specs: Vec<ParameterSpec>,
        internal_ranges: Option<Vec<ParamRange>>,
        build_op: OpBuilder,
    ) -> Self {
        debug_assert!(
            internal_ranges.as_ref().is_none_or(|r| r.len() == specs.len()),
            "internal range table must parallel the parameter table"
        );
        let live: Vec<ParamValue> = specs.iter().map(|s| s.initial_value()).collect();
        let stash = live.clone();
        Self {
            key: key.to_string(),
            title: title.to_string(),
            category,
            is_blend,
            specs,
            internal_ranges,
            live,
            stash,
            op: build_op(),
            build_op,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether this operation needs a second input image.
    pub fn is_blend(&self) -> bool {
        self.is_blend
    }

    pub fn parameter_count(&self) -> usize {
        self.specs.len()
    }

    pub fn spec(&self, index: usize) -> Option<&ParameterSpec> {
        self.specs.get(index)
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    // ------------------------------------------------------------------
    //  Scalar access
    // ------------------------------------------------------------------

    /// Current scalar value at `index`, or [`PARAMETER_NOT_SET`] when the
    /// index is out of range or names a colour parameter.
    pub fn parameter(&self, index: usize) -> f32 {
        match self.live.get(index) {
            Some(ParamValue::Scalar(v)) => *v,
            _ => PARAMETER_NOT_SET,
        }
    }

    /// Set the scalar at `index`, clamped into the spec's `[min, max]`.
    /// Out-of-range or kind-mismatched indices are a logged no-op.
    pub fn set_parameter(&mut self, index: usize, value: f32) {
        if let Err(e) = self.try_set_parameter(index, value) {
            log_warn!("{}: ignored scalar write: {}", self.key, e);
        }
    }

    /// Checked variant of [`set_parameter`](Self::set_parameter); the single
    /// code path all scalar writes go through.
    pub fn try_set_parameter(&mut self, index: usize, value: f32) -> Result<(), FilterError> {
        let spec = self.specs.get(index).ok_or(FilterError::InvalidIndex(index))?;
        if spec.kind != ParameterKind::Scalar {
            return Err(FilterError::KindMismatch(index));
        }
        self.live[index] = ParamValue::Scalar(spec.clamp(value));
        Ok(())
    }

    // ------------------------------------------------------------------
    //  Colour access
    // ------------------------------------------------------------------

    /// Current colour at `index`; `None` for out-of-range or scalar-kind
    /// indices (the colour analogue of the sentinel).
    pub fn color_parameter(&self, index: usize) -> Option<Rgba> {
        self.live.get(index).and_then(|v| v.as_color())
    }

    pub fn set_color_parameter(&mut self, index: usize, color: Rgba) {
        if let Err(e) = self.try_set_color_parameter(index, color) {
            log_warn!("{}: ignored colour write: {}", self.key, e);
        }
    }

    pub fn try_set_color_parameter(&mut self, index: usize, color: Rgba) -> Result<(), FilterError> {
        let spec = self.specs.get(index).ok_or(FilterError::InvalidIndex(index))?;
        if spec.kind != ParameterKind::Color {
            return Err(FilterError::KindMismatch(index));
        }
        // Rgba construction already clamps; re-clamp in case the caller
        // built the struct by hand.
        self.live[index] = ParamValue::Color(Rgba::new(color.r, color.g, color.b, color.a));
        Ok(())
    }

    // ------------------------------------------------------------------
    //  Stash / restore
    // ------------------------------------------------------------------

    /// Snapshot the live values.  Call before an interactive edit begins;
    /// the descriptor does not police call ordering — the edit controller
    /// owns that protocol.
    pub fn stash_parameters(&mut self) {
        self.stash.clone_from(&self.live);
    }

    /// Roll the live values back to the last snapshot (cancelled edit).
    pub fn restore_parameters(&mut self) {
        self.live.clone_from(&self.stash);
    }

    /// Rebuild the underlying operation from scratch, clearing whatever
    /// non-parametric state it accumulated, then restore the stashed values
    /// so a pending edit's rollback point survives the reset.
    pub fn reset(&mut self) {
        self.op = (self.build_op)();
        for (value, spec) in self.live.iter_mut().zip(&self.specs) {
            *value = spec.initial_value();
        }
        self.restore_parameters();
    }

    // ------------------------------------------------------------------
    //  Application
    // ------------------------------------------------------------------

    /// Run the operation once.  Blend descriptors require `second`.
    pub fn apply(
        &mut self,
        image: &RgbaImage,
        second: Option<&RgbaImage>,
    ) -> Result<RgbaImage, FilterError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FilterError::EmptyInput);
        }
        if self.is_blend && second.is_none() {
            return Err(FilterError::MissingSecondInput);
        }
        let params = self.resolved_values();
        Ok(self.op.apply(&params, image, second))
    }

    /// Live values translated into the units the operation consumes.
    fn resolved_values(&self) -> Vec<ParamValue> {
        match &self.internal_ranges {
            None => self.live.clone(),
            Some(ranges) => self
                .live
                .iter()
                .zip(self.specs.iter().zip(ranges))
                .map(|(value, (spec, internal))| match value {
                    ParamValue::Scalar(v) => {
                        ParamValue::Scalar(remap(*v, spec.range(), *internal))
                    }
                    ParamValue::Color(c) => ParamValue::Color(*c),
                })
                .collect(),
        }
    }

    /// Public-range → internal-range projection for parameter `index`.
    /// Identity when the descriptor has no derived ranges.
    pub fn to_internal(&self, index: usize, value: f32) -> f32 {
        match (&self.internal_ranges, self.specs.get(index)) {
            (Some(ranges), Some(spec)) => remap(value, spec.range(), ranges[index]),
            (None, Some(spec)) => spec.clamp(value),
            _ => PARAMETER_NOT_SET,
        }
    }

    /// Internal-range → public-range projection for parameter `index`.
    pub fn to_public(&self, index: usize, value: f32) -> f32 {
        match (&self.internal_ranges, self.specs.get(index)) {
            (Some(ranges), Some(spec)) => remap(value, ranges[index], spec.range()),
            (None, Some(spec)) => spec.clamp(value),
            _ => PARAMETER_NOT_SET,
        }
    }
}

impl std::fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("key", &self.key)
            .field("category", &self.category)
            .field("is_blend", &self.is_blend)
            .field("parameters", &self.specs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::params::ParameterSpec;

    /// Pass-through op that ignores its parameters.
    struct Identity;
    impl FilterOp for Identity {
        fn apply(
            &mut self,
            _params: &[ParamValue],
            image: &RgbaImage,
            _second: Option<&RgbaImage>,
        ) -> RgbaImage {
            image.clone()
        }
    }

    fn identity_op() -> Box<dyn FilterOp> {
        Box::new(Identity)
    }

    fn test_descriptor() -> FilterDescriptor {
        FilterDescriptor::new(
            "Test",
            "Test Filter",
            Category::ColorAdjustments,
            false,
            vec![
                ParameterSpec::scalar("amount", -100.0, 100.0, 0.0),
                ParameterSpec::scalar("radius", 0.0, 10.0, 2.0),
                ParameterSpec::color("tint colour"),
            ],
            None,
            identity_op,
        )
    }

    #[test]
    fn set_clamps_into_spec_bounds() {
        let mut d = test_descriptor();
        d.set_parameter(0, 250.0);
        assert_eq!(d.parameter(0), 100.0);
        d.set_parameter(0, -250.0);
        assert_eq!(d.parameter(0), -100.0);
        d.set_parameter(1, -1.0);
        assert_eq!(d.parameter(1), 0.0);
    }

    #[test]
    fn invalid_index_yields_sentinel_and_noop() {
        let mut d = test_descriptor();
        assert_eq!(d.parameter(17), PARAMETER_NOT_SET);
        // colour-kind index read through the scalar accessor
        assert_eq!(d.parameter(2), PARAMETER_NOT_SET);
        assert_eq!(d.try_set_parameter(17, 1.0), Err(FilterError::InvalidIndex(17)));
        assert_eq!(d.try_set_parameter(2, 1.0), Err(FilterError::KindMismatch(2)));
        // the logged no-op variant must not panic either
        d.set_parameter(17, 1.0);
    }

    #[test]
    fn color_accessors_respect_kind() {
        let mut d = test_descriptor();
        assert!(d.color_parameter(0).is_none());
        let c = Rgba::new(0.25, 0.5, 0.75, 1.0);
        d.set_color_parameter(2, c);
        assert_eq!(d.color_parameter(2), Some(c));
        assert_eq!(
            d.try_set_color_parameter(0, c),
            Err(FilterError::KindMismatch(0))
        );
    }

    #[test]
    fn stash_then_mutate_then_restore_is_exact() {
        let mut d = test_descriptor();
        d.set_parameter(0, 33.25);
        d.set_parameter(1, 7.5);
        d.set_color_parameter(2, Rgba::new(0.1, 0.2, 0.3, 0.4));
        d.stash_parameters();

        d.set_parameter(0, -61.0);
        d.set_parameter(1, 0.125);
        d.set_color_parameter(2, Rgba::WHITE);
        d.restore_parameters();

        assert_eq!(d.parameter(0), 33.25);
        assert_eq!(d.parameter(1), 7.5);
        assert_eq!(d.color_parameter(2), Some(Rgba::new(0.1, 0.2, 0.3, 0.4)));
    }

    #[test]
    fn reset_rebuilds_but_keeps_stash() {
        let mut d = test_descriptor();
        d.set_parameter(0, 40.0);
        d.stash_parameters();
        d.set_parameter(0, 90.0);
        d.reset();
        // reset restores the stashed values, not the spec initials
        assert_eq!(d.parameter(0), 40.0);
    }

    #[test]
    fn blend_without_second_input_is_an_error() {
        let mut d = FilterDescriptor::new(
            "TestBlend",
            "Test Blend",
            Category::BlendModes,
            true,
            vec![ParameterSpec::scalar("opacity", 0.0, 1.0, 1.0)],
            None,
            identity_op,
        );
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        assert_eq!(d.apply(&img, None), Err(FilterError::MissingSecondInput));
        assert!(d.apply(&img, Some(&img)).is_ok());
    }

    #[test]
    fn empty_input_is_an_error() {
        let mut d = test_descriptor();
        let img = RgbaImage::new(0, 0);
        assert_eq!(d.apply(&img, None), Err(FilterError::EmptyInput));
    }

    #[test]
    fn derived_range_round_trip() {
        let d = FilterDescriptor::new(
            "TestPreset",
            "Test Preset",
            Category::ColorAdjustments,
            false,
            vec![
                ParameterSpec::scalar("temperature", 2500.0, 7500.0, 5000.0),
                ParameterSpec::scalar("tint", -100.0, 100.0, 0.0),
            ],
            Some(vec![
                ParamRange::new(2500.0, 7500.0),
                ParamRange::new(-200.0, 200.0),
            ]),
            identity_op,
        );
        for &v in &[2500.0f32, 4200.0, 5000.0, 7499.0, 7500.0] {
            let back = d.to_public(0, d.to_internal(0, v));
            assert!((back - v).abs() < 1e-2, "{} -> {}", v, back);
        }
        for &v in &[-100.0f32, -12.5, 0.0, 99.0, 100.0] {
            let back = d.to_public(1, d.to_internal(1, v));
            assert!((back - v).abs() < 1e-3, "{} -> {}", v, back);
        }
        // and the internal-first direction
        for &v in &[-200.0f32, -50.0, 0.0, 200.0] {
            let back = d.to_internal(1, d.to_public(1, v));
            assert!((back - v).abs() < 1e-3, "{} -> {}", v, back);
        }
    }
}
