// ============================================================================
// IMAGE SOURCE — injected supplier of the bitmap being filtered
// ============================================================================

use image::RgbaImage;

use crate::transform::Extent;

/// Where the pixels come from (camera frame, photo library selection, …).
/// The core treats this as opaque; implementations live in the app shell.
pub trait ImageSource {
    /// The current working image, optionally downsampled to roughly `size`
    /// (gallery thumbnails ask small, the editor asks full-size).
    fn current_image(&self, size: Option<Extent>) -> RgbaImage;

    /// Width/height ratio of the full-size image.
    fn aspect_ratio(&self) -> f32;
}

/// Deterministic gradient-and-grid pattern, for tests and tooling.
pub struct TestPatternSource {
    width: u32,
    height: u32,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width: width.max(1), height: height.max(1) }
    }

    fn render(&self, width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let grid = if x % 32 < 2 || y % 32 < 2 { 255 } else { 64 };
            image::Rgba([r, g, grid, 255])
        })
    }
}

impl ImageSource for TestPatternSource {
    fn current_image(&self, size: Option<Extent>) -> RgbaImage {
        match size {
            None => self.render(self.width, self.height),
            Some(extent) => {
                let w = (extent.width.round() as u32).clamp(1, self.width);
                let h = (extent.height.round() as u32).clamp(1, self.height);
                self.render(w, h)
            }
        }
    }

    fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
