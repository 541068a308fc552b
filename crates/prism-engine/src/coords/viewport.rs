/// Viewport in logical pixels plus the pixel density used to render it.
///
/// `pixel_density` is the ratio of rendered (physical) pixels to logical pixels.
/// It is capped by the caller (see [`Viewport::from_window`]) so very dense
/// displays do not multiply the cost of every full-screen pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_density: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32, pixel_density: f32) -> Self {
        Self { width, height, pixel_density }
    }

    /// Builds a viewport from a window's physical size and scale factor.
    ///
    /// Pixel density is `min(scale_factor, max_density)`.
    pub fn from_window(physical: (u32, u32), scale_factor: f64, max_density: f32) -> Self {
        let scale = scale_factor.max(f64::EPSILON) as f32;
        Self {
            width: physical.0 as f32 / scale,
            height: physical.1 as f32 / scale,
            pixel_density: clamp_pixel_density(scale, max_density),
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
            && self.pixel_density > 0.0
    }

    /// Width / height, or 1 for degenerate sizes.
    pub fn aspect(self) -> f32 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }

    /// Render resolution in physical pixels (at least 1×1).
    pub fn physical_size(self) -> (u32, u32) {
        let w = (self.width * self.pixel_density).floor().max(1.0) as u32;
        let h = (self.height * self.pixel_density).floor().max(1.0) as u32;
        (w, h)
    }
}

/// Caps a display scale factor to the density actually rendered.
///
/// Scale factors below 1 pass through unchanged; a non-positive or non-finite
/// factor falls back to 1.
pub fn clamp_pixel_density(scale_factor: f32, max_density: f32) -> f32 {
    if !(scale_factor.is_finite() && scale_factor > 0.0) {
        return 1.0;
    }
    scale_factor.min(max_density)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_size_scales_by_density() {
        let vp = Viewport::new(800.0, 600.0, 2.0);
        assert_eq!(vp.physical_size(), (1600, 1200));
    }

    #[test]
    fn density_is_capped() {
        assert_eq!(clamp_pixel_density(3.0, 2.0), 2.0);
        assert_eq!(clamp_pixel_density(1.5, 2.0), 1.5);
        assert_eq!(clamp_pixel_density(1.0, 2.0), 1.0);
    }

    #[test]
    fn low_density_displays_are_not_raised_to_one() {
        assert_eq!(clamp_pixel_density(0.75, 2.0), 0.75);
        assert_eq!(clamp_pixel_density(0.0, 2.0), 1.0);
        assert_eq!(clamp_pixel_density(f32::NAN, 2.0), 1.0);
    }

    #[test]
    fn from_window_on_a_dense_display() {
        // 3x display, 2x cap: logical size is preserved, render size shrinks.
        let vp = Viewport::from_window((3000, 1500), 3.0, 2.0);
        assert_eq!(vp.width, 1000.0);
        assert_eq!(vp.height, 500.0);
        assert_eq!(vp.pixel_density, 2.0);
        assert_eq!(vp.physical_size(), (2000, 1000));
    }

    #[test]
    fn degenerate_sizes_stay_renderable() {
        let vp = Viewport::new(0.0, 0.0, 1.0);
        assert!(!vp.is_valid());
        assert_eq!(vp.physical_size(), (1, 1));
        assert_eq!(vp.aspect(), 1.0);
    }
}
