// ============================================================================
// DISPLAY TRANSFORM — orientation-aware image → surface placement + inverse
// ============================================================================
//
// Pure geometry, no GPU types.  Given the extent of a filtered image and the
// extent of the drawable it lands on, `Placement::compute` decides:
//
//   * whether the image is logically rotated ±90° to align orientations,
//   * whether to aspect-fill (matching orientations) or aspect-fit
//     (mismatched orientations, letterboxed),
//   * the uniform scale and the translation anchoring the result.
//
// The same `Placement` then answers point-mapping queries in both
// directions.  The inverse mapping MUST use the placement stored at render
// time: surface extents change between a render and a touch query (e.g.
// during rotation animation), and recomputing from current extents would
// mis-map the touch.
//
// Conventions: image and device coordinates are y-up (origin bottom-left),
// matching the renderer.  View/touch points are y-down (origin top-left) in
// view units; the view-level helpers do the pixel-ratio multiply and the
// flip.
// ============================================================================

/// A width/height pair, in whatever unit the context implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn of_image(image: &image::RgbaImage) -> Self {
        Self::new(image.width() as f32, image.height() as f32)
    }

    /// Strictly taller than wide.  Squares count as landscape.
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    /// Width/height swapped (the footprint after a ±90° rotation).
    pub fn rotated(&self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }
}

/// Logical rotation applied to align image orientation with the surface.
///
/// The sign convention is fixed: a portrait image shown on a landscape
/// surface rotates +90° (counter-clockwise in y-up coordinates is positive,
/// so `Plus90`); a landscape image on a portrait surface rotates −90°.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Plus90,
    Minus90,
}

impl Rotation {
    pub fn angle_radians(self) -> f32 {
        match self {
            Rotation::None => 0.0,
            Rotation::Plus90 => std::f32::consts::FRAC_PI_2,
            Rotation::Minus90 => -std::f32::consts::FRAC_PI_2,
        }
    }

    pub fn is_rotated(self) -> bool {
        self != Rotation::None
    }
}

/// How the image is scaled into the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Surface fully covered, image may crop (orientations match).
    Fill,
    /// Whole image visible, letterboxed (orientations mismatch).
    Fit,
}

/// Axis-aligned rectangle, y-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Centered rect scaling `content` to be fully contained in `bounds`.
pub fn aspect_fit_rect(content: Extent, bounds: Extent) -> Rect {
    scaled_centered_rect(content, bounds, fit_scale(content, bounds))
}

/// Centered rect scaling `content` to fully cover `bounds` (may overflow).
pub fn aspect_fill_rect(content: Extent, bounds: Extent) -> Rect {
    scaled_centered_rect(content, bounds, fill_scale(content, bounds))
}

fn fit_scale(content: Extent, bounds: Extent) -> f32 {
    (bounds.width / content.width).min(bounds.height / content.height)
}

fn fill_scale(content: Extent, bounds: Extent) -> f32 {
    (bounds.width / content.width).max(bounds.height / content.height)
}

fn scaled_centered_rect(content: Extent, bounds: Extent, scale: f32) -> Rect {
    let width = content.width * scale;
    let height = content.height * scale;
    Rect {
        x: (bounds.width - width) / 2.0,
        y: (bounds.height - height) / 2.0,
        width,
        height,
    }
}

/// The full forward transform decided for one render: rotate about the
/// origin, scale uniformly, translate.  Memoized per render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub rotation: Rotation,
    pub fit: FitMode,
    pub scale: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    /// Unrotated image extent, image pixels.
    pub image: Extent,
    /// Surface extent, device pixels.
    pub surface: Extent,
}

impl Placement {
    /// Decide rotation, fit mode, scale and anchor for `image` on `surface`.
    pub fn compute(image: Extent, surface: Extent) -> Self {
        let rotation = match (image.is_portrait(), surface.is_portrait()) {
            (true, false) => Rotation::Plus90,
            (false, true) => Rotation::Minus90,
            _ => Rotation::None,
        };
        // Matching orientations fill the surface (camera content normally
        // shares the surface's aspect family, cropping looks intentional);
        // a mismatch is treated as accidental and letterboxed instead.
        let fit = if rotation.is_rotated() { FitMode::Fit } else { FitMode::Fill };

        let effective = match rotation {
            Rotation::None => image,
            _ => image.rotated(),
        };
        let (rect, scale) = match fit {
            FitMode::Fill => (aspect_fill_rect(effective, surface), fill_scale(effective, surface)),
            FitMode::Fit => (aspect_fit_rect(effective, surface), fit_scale(effective, surface)),
        };

        let origin_x;
        let origin_y;
        if effective.width > effective.height {
            // Landscape content rides against the top edge of the surface.
            origin_x = rect.x;
            origin_y = (surface.height - rect.height).abs();
        } else {
            // Portrait (or square) content centers horizontally.  A rotated
            // image's coordinate origin moves with the rotation, hence the
            // full-height translation.
            origin_x = (surface.width - rect.width) / 2.0;
            origin_y = if rotation.is_rotated() { surface.height } else { rect.y };
        }

        Self {
            rotation,
            fit,
            scale,
            origin_x,
            origin_y,
            image,
            surface,
        }
    }

    // ------------------------------------------------------------------
    //  Device-pixel mapping (y-up both sides)
    // ------------------------------------------------------------------

    /// Forward: image point → device point (rotate, scale, translate).
    pub fn image_to_device(&self, x: f32, y: f32) -> (f32, f32) {
        let (rx, ry) = match self.rotation {
            Rotation::None => (x, y),
            Rotation::Plus90 => (-y, x),
            Rotation::Minus90 => (y, -x),
        };
        (self.origin_x + self.scale * rx, self.origin_y + self.scale * ry)
    }

    /// Inverse: device point → image point.  Undoes translate, scale and
    /// rotation in that order; the three rotation cases are dispatched on
    /// the rotation stored at render time, never re-derived.
    pub fn device_to_image(&self, x: f32, y: f32) -> (f32, f32) {
        let ux = (x - self.origin_x) / self.scale;
        let uy = (y - self.origin_y) / self.scale;
        match self.rotation {
            Rotation::None => (ux, uy),
            Rotation::Plus90 => (uy, -ux),
            Rotation::Minus90 => (-uy, ux),
        }
    }

    // ------------------------------------------------------------------
    //  View-level mapping (touch points, y-down view units)
    // ------------------------------------------------------------------

    /// Touch point in view units → image pixel position.
    pub fn view_to_image(&self, x: f32, y: f32, pixel_ratio: f32) -> (f32, f32) {
        let dx = x * pixel_ratio;
        let dy = self.surface.height - y * pixel_ratio; // flip to y-up
        self.device_to_image(dx, dy)
    }

    /// Image pixel position → view point in view units.
    pub fn image_to_view(&self, x: f32, y: f32, pixel_ratio: f32) -> (f32, f32) {
        let (dx, dy) = self.image_to_device(x, y);
        (dx / pixel_ratio, (self.surface.height - dy) / pixel_ratio)
    }
}
