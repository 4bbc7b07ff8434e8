use crate::color::Rgb;
use image::{Rgba, RgbaImage};
use rand::Rng;

/// Largest width or height a surface can be acquired with
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// RGBA drawing surface with canvas-style source-over blending.
///
/// Pixels are stored unpremultiplied. A freshly acquired or cleared surface is fully
/// transparent.
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Allocate a surface. Zero-sized surfaces are allowed (nothing gets drawn);
    /// dimensions past `MAX_SURFACE_DIMENSION` cannot be acquired.
    pub fn acquire(width: u32, height: u32) -> Result<Self, String> {
        if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
            return Err(format!(
                "Cannot acquire a {}x{} drawing surface (limit {} per side)",
                width, height, MAX_SURFACE_DIMENSION
            ));
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// True when either side is zero
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Change pixel dimensions. Contents are discarded; oversize requests are clamped.
    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.min(MAX_SURFACE_DIMENSION);
        let height = height.min(MAX_SURFACE_DIMENSION);
        if width != self.width() || height != self.height() {
            self.image = RgbaImage::new(width, height);
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.image.get_pixel_checked(x, y).copied()
    }

    /// Reset every pixel to transparent black
    pub fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    /// Overwrite every pixel with an opaque color computed from its center
    pub fn fill_with<F: Fn(f32, f32) -> Rgb>(&mut self, color_at: F) {
        for (x, y, pixel) in self.image.enumerate_pixels_mut() {
            let c = color_at(x as f32 + 0.5, y as f32 + 0.5);
            *pixel = Rgba([c.r, c.g, c.b, 255]);
        }
    }

    /// Source-over blend of `color` at `alpha` (0..=1) onto one pixel
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        if let Some(pixel) = self.image.get_pixel_mut_checked(x, y) {
            *pixel = blend_over(*pixel, color, alpha);
        }
    }

    /// Solid disc with a one-pixel antialiased rim
    pub fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        self.fill_radial(cx, cy, radius + 0.5, color, |d| {
            alpha * (radius + 0.5 - d).clamp(0.0, 1.0)
        });
    }

    /// Radial gradient from `color` at the center to transparent at `radius`
    pub fn radial_glow(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        if radius <= 0.0 {
            return;
        }
        self.fill_radial(cx, cy, radius, color, |d| alpha * (1.0 - d / radius));
    }

    /// Shade every pixel within `reach` of `(cx, cy)` with `alpha_at(distance)`
    fn fill_radial<F: Fn(f32) -> f32>(&mut self, cx: f32, cy: f32, reach: f32, color: Rgb, alpha_at: F) {
        self.fill_region(cx, cy, reach, color, |x, y| {
            let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            if d < reach {
                alpha_at(d)
            } else {
                0.0
            }
        });
    }

    /// Shade the square box of half-side `reach` around `(cx, cy)` with a per-pixel alpha
    pub fn fill_region<F: Fn(f32, f32) -> f32>(&mut self, cx: f32, cy: f32, reach: f32, color: Rgb, alpha_at: F) {
        if reach <= 0.0 || self.is_degenerate() || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let max_x = self.width() as f32 - 1.0;
        let max_y = self.height() as f32 - 1.0;
        let x0 = (cx - reach).floor().clamp(0.0, max_x) as u32;
        let x1 = (cx + reach).ceil().clamp(0.0, max_x) as u32;
        let y0 = (cy - reach).floor().clamp(0.0, max_y) as u32;
        let y1 = (cy + reach).ceil().clamp(0.0, max_y) as u32;

        for y in y0..=y1 {
            for x in x0..=x1 {
                self.blend_pixel(x, y, color, alpha_at(x as f32 + 0.5, y as f32 + 0.5));
            }
        }
    }

    /// One-pixel line, stepped along the major axis
    pub fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb, alpha: f32) {
        if self.is_degenerate() || ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + dx * t;
            let y = y0 + dy * t;
            if x >= 0.0 && y >= 0.0 {
                self.blend_pixel(x as u32, y as u32, color, alpha);
            }
        }
    }

    /// Per-pixel brightness jitter: each pixel, with `probability`, gets one uniform offset in
    /// `[-magnitude, magnitude)` added to R, G and B (rounded, clamped to 0..=255).
    pub fn apply_noise<R: Rng>(&mut self, rng: &mut R, probability: f32, magnitude: f32) {
        if probability <= 0.0 || magnitude <= 0.0 {
            return;
        }
        for pixel in self.image.pixels_mut() {
            if rng.gen::<f32>() < probability {
                let noise = rng.gen_range(-magnitude..magnitude);
                for channel in &mut pixel.0[..3] {
                    *channel = (*channel as f32 + noise).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    /// Source-over composite of `layer` onto this surface, aligned at the origin
    pub fn composite(&mut self, layer: &Surface) {
        let width = self.width().min(layer.width());
        let height = self.height().min(layer.height());
        for y in 0..height {
            for x in 0..width {
                let src = *layer.image.get_pixel(x, y);
                if src.0[3] == 0 {
                    continue;
                }
                let dst = self.image.get_pixel_mut(x, y);
                *dst = blend_over(
                    *dst,
                    Rgb::new(src.0[0], src.0[1], src.0[2]),
                    src.0[3] as f32 / 255.0,
                );
            }
        }
    }
}

/// Unpremultiplied source-over
fn blend_over(dst: Rgba<u8>, color: Rgb, alpha: f32) -> Rgba<u8> {
    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = alpha + dst_a * (1.0 - alpha);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |src: u8, dst: u8| {
        ((src as f32 * alpha + dst as f32 * dst_a * (1.0 - alpha)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(color.r, dst.0[0]),
        mix(color.g, dst.0[1]),
        mix(color.b, dst.0[2]),
        (out_a * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn test_acquire_limits() {
        assert!(Surface::acquire(0, 0).is_ok());
        assert!(Surface::acquire(MAX_SURFACE_DIMENSION, 1).is_ok());
        assert!(Surface::acquire(MAX_SURFACE_DIMENSION + 1, 10).is_err());
        assert!(Surface::acquire(10, u32::MAX).is_err());
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = Surface::acquire(4, 4).unwrap();
        assert!(surface.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
        assert!(!surface.is_degenerate());
        assert!(Surface::acquire(0, 5).unwrap().is_degenerate());
    }

    #[test]
    fn test_blend_onto_transparent_keeps_color() {
        let mut surface = Surface::acquire(2, 2).unwrap();
        surface.blend_pixel(0, 0, RED, 0.5);
        assert_eq!(surface.pixel(0, 0).unwrap().0, [255, 0, 0, 128]);
        // Out of bounds is ignored
        surface.blend_pixel(5, 5, RED, 1.0);
    }

    #[test]
    fn test_blend_onto_opaque() {
        let mut surface = Surface::acquire(1, 1).unwrap();
        surface.fill_with(|_, _| Rgb::new(0, 0, 255));
        surface.blend_pixel(0, 0, RED, 0.5);
        assert_eq!(surface.pixel(0, 0).unwrap().0, [128, 0, 128, 255]);
    }

    #[test]
    fn test_disc_covers_center_not_far_pixels() {
        let mut surface = Surface::acquire(20, 20).unwrap();
        surface.fill_disc(10.0, 10.0, 3.0, RED, 1.0);
        assert_eq!(surface.pixel(10, 10).unwrap().0, [255, 0, 0, 255]);
        assert_eq!(surface.pixel(0, 0).unwrap().0[3], 0);
        assert_eq!(surface.pixel(10, 16).unwrap().0[3], 0);
    }

    #[test]
    fn test_glow_fades_outwards() {
        let mut surface = Surface::acquire(40, 40).unwrap();
        surface.radial_glow(20.0, 20.0, 12.0, RED, 1.0);
        let center = surface.pixel(20, 20).unwrap().0[3];
        let mid = surface.pixel(26, 20).unwrap().0[3];
        let edge = surface.pixel(33, 20).unwrap().0[3];
        assert!(center > mid);
        assert!(mid > edge);
        assert_eq!(edge, 0);
    }

    #[test]
    fn test_stroke_line_endpoints() {
        let mut surface = Surface::acquire(10, 10).unwrap();
        surface.stroke_line(1.0, 1.0, 8.0, 5.0, RED, 1.0);
        assert_eq!(surface.pixel(1, 1).unwrap().0[3], 255);
        assert_eq!(surface.pixel(8, 5).unwrap().0[3], 255);
        assert_eq!(surface.pixel(1, 8).unwrap().0[3], 0);
    }

    #[test]
    fn test_drawing_on_degenerate_surface_is_noop() {
        let mut surface = Surface::acquire(0, 0).unwrap();
        surface.fill_disc(0.0, 0.0, 5.0, RED, 1.0);
        surface.radial_glow(0.0, 0.0, 5.0, RED, 1.0);
        surface.stroke_line(0.0, 0.0, 5.0, 5.0, RED, 1.0);
        assert!(surface.is_degenerate());
    }

    #[test]
    fn test_noise_bounds_and_sparsity() {
        let mut surface = Surface::acquire(100, 100).unwrap();
        surface.fill_with(|_, _| Rgb::new(128, 0, 255));
        let mut rng = StdRng::seed_from_u64(42);
        surface.apply_noise(&mut rng, 0.01, 5.0);

        let mut touched = 0;
        for p in surface.image().pixels() {
            if p.0 != [128, 0, 255, 255] {
                touched += 1;
                assert!((123..=133).contains(&p.0[0]));
                assert!(p.0[1] <= 5);
                assert!(p.0[2] >= 250);
                assert_eq!(p.0[3], 255);
            }
        }
        // ~1% of 10_000 pixels
        assert!(touched > 30 && touched < 250, "touched {}", touched);
    }

    #[test]
    fn test_composite_over_background() {
        let mut base = Surface::acquire(2, 1).unwrap();
        base.fill_with(|_, _| Rgb::new(0, 0, 0));
        let mut layer = Surface::acquire(2, 1).unwrap();
        layer.blend_pixel(1, 0, Rgb::new(200, 200, 200), 1.0);
        base.composite(&layer);
        assert_eq!(base.pixel(0, 0).unwrap().0, [0, 0, 0, 255]);
        assert_eq!(base.pixel(1, 0).unwrap().0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_resize_clamps() {
        let mut surface = Surface::acquire(4, 4).unwrap();
        surface.resize(MAX_SURFACE_DIMENSION * 2, 3);
        assert_eq!(surface.width(), MAX_SURFACE_DIMENSION);
        assert_eq!(surface.height(), 3);
        surface.resize(0, 0);
        assert!(surface.is_degenerate());
    }
}
