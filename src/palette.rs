use crate::color::{hex, Rgb};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Two-stop linear gradient, angle in CSS degrees (0 = towards the top, 90 = towards the right)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientSpec {
    pub angle: f32,
    pub from: Rgb,
    pub to: Rgb,
}

impl GradientSpec {
    pub const fn diagonal(from: Rgb, to: Rgb) -> Self {
        Self {
            angle: 135.0,
            from,
            to,
        }
    }

    /// CSS notation, for display
    pub fn css(&self) -> String {
        format!(
            "linear-gradient({}deg, {} 0%, {} 100%)",
            self.angle, self.from, self.to
        )
    }

    /// Interpolate both stops and the angle
    pub fn lerp(&self, other: &GradientSpec, t: f32) -> GradientSpec {
        let t = t.clamp(0.0, 1.0);
        GradientSpec {
            angle: self.angle + (other.angle - self.angle) * t,
            from: self.from.lerp(other.from, t),
            to: self.to.lerp(other.to, t),
        }
    }

    /// Gradient position (0..=1) of pixel `(x, y)` on a `width` x `height` box.
    ///
    /// The gradient line passes through the center and is long enough that the corners
    /// sit exactly on the 0% and 100% stops.
    pub fn position_at(&self, x: f32, y: f32, width: f32, height: f32) -> f32 {
        let rad = self.angle.to_radians();
        let (dx, dy) = (rad.sin(), -rad.cos());
        let length = (width * dx).abs() + (height * dy).abs();
        if length <= f32::EPSILON {
            return 0.0;
        }
        let projected = (x - width / 2.0) * dx + (y - height / 2.0) * dy;
        (projected / length + 0.5).clamp(0.0, 1.0)
    }

    pub fn color_at(&self, x: f32, y: f32, width: f32, height: f32) -> Rgb {
        self.from.lerp(self.to, self.position_at(x, y, width, height))
    }
}

/// A background gradient plus the colors particles may take while it is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    pub background: GradientSpec,
    pub particles: Vec<Rgb>,
}

impl Palette {
    pub fn new(name: impl Into<String>, background: GradientSpec, particles: &[Rgb]) -> Self {
        Self {
            name: name.into(),
            background,
            particles: particles.to_vec(),
        }
    }

    /// Uniformly pick one particle color. Falls back to the gradient start for an empty list.
    pub fn random_color<R: Rng>(&self, rng: &mut R) -> Rgb {
        if self.particles.is_empty() {
            return self.background.from;
        }
        self.particles[rng.gen_range(0..self.particles.len())]
    }

    #[cfg(test)]
    pub fn contains(&self, color: Rgb) -> bool {
        self.particles.contains(&color)
    }
}

pub const INDIGO: Rgb = hex(0x667eea);
pub const PURPLE: Rgb = hex(0x764ba2);
pub const SKY: Rgb = hex(0x4facfe);
pub const CYAN: Rgb = hex(0x00f2fe);
pub const GREEN: Rgb = hex(0x43e97b);
pub const AQUA: Rgb = hex(0x38f9d7);
pub const PINK: Rgb = hex(0xfa709a);
pub const YELLOW: Rgb = hex(0xfee140);
pub const CORAL: Rgb = hex(0xff6b6b);
pub const ROSE: Rgb = hex(0xf5576c);
pub const ORCHID: Rgb = hex(0xf093fb);

/// Gradient shown before any cycle has started
pub const DEFAULT_BACKGROUND: GradientSpec = GradientSpec::diagonal(INDIGO, PURPLE);

/// The four palettes cycled behind the particle field
pub fn professional_palettes() -> Vec<Palette> {
    vec![
        Palette::new(
            "Twilight",
            GradientSpec::diagonal(INDIGO, PURPLE),
            &[SKY, CYAN, INDIGO, PURPLE],
        ),
        Palette::new(
            "Ocean",
            GradientSpec::diagonal(SKY, CYAN),
            &[SKY, CYAN, INDIGO, GREEN],
        ),
        Palette::new(
            "Mint",
            GradientSpec::diagonal(GREEN, AQUA),
            &[GREEN, AQUA, SKY, CYAN],
        ),
        Palette::new(
            "Sunset",
            GradientSpec::diagonal(PINK, YELLOW),
            &[PINK, YELLOW, CORAL, ROSE],
        ),
    ]
}

/// The five gradients of the morphing background. Particle colors are the gradient stops.
pub fn morphing_palettes() -> Vec<Palette> {
    [
        ("Twilight", INDIGO, PURPLE),
        ("Blossom", ORCHID, ROSE),
        ("Ocean", SKY, CYAN),
        ("Mint", GREEN, AQUA),
        ("Sunset", PINK, YELLOW),
    ]
    .into_iter()
    .map(|(name, from, to)| Palette::new(name, GradientSpec::diagonal(from, to), &[from, to]))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_css_notation() {
        assert_eq!(
            DEFAULT_BACKGROUND.css(),
            "linear-gradient(135deg, #667eea 0%, #764ba2 100%)"
        );
    }

    #[test]
    fn test_diagonal_gradient_corners() {
        let g = DEFAULT_BACKGROUND;
        assert!(g.position_at(0.0, 0.0, 200.0, 100.0) < 1e-5);
        assert!((g.position_at(200.0, 100.0, 200.0, 100.0) - 1.0).abs() < 1e-5);
        assert!((g.position_at(100.0, 50.0, 200.0, 100.0) - 0.5).abs() < 1e-5);
        assert_eq!(g.color_at(0.0, 0.0, 200.0, 100.0), INDIGO);
    }

    #[test]
    fn test_horizontal_gradient() {
        let g = GradientSpec {
            angle: 90.0,
            from: Rgb::new(0, 0, 0),
            to: Rgb::new(200, 200, 200),
        };
        assert!((g.position_at(25.0, 0.0, 100.0, 10.0) - 0.25).abs() < 1e-5);
        assert!((g.position_at(25.0, 10.0, 100.0, 10.0) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_box() {
        assert_eq!(DEFAULT_BACKGROUND.position_at(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_gradient_lerp() {
        let a = GradientSpec::diagonal(Rgb::new(0, 0, 0), Rgb::new(0, 0, 0));
        let b = GradientSpec::diagonal(Rgb::new(100, 100, 100), Rgb::new(200, 200, 200));
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.from, Rgb::new(50, 50, 50));
        assert_eq!(mid.to, Rgb::new(100, 100, 100));
        assert_eq!(mid.angle, 135.0);
    }

    #[test]
    fn test_random_color_comes_from_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for palette in professional_palettes() {
            for _ in 0..50 {
                assert!(palette.contains(palette.random_color(&mut rng)));
            }
        }
    }

    #[test]
    fn test_empty_palette_falls_back_to_background() {
        let mut rng = StdRng::seed_from_u64(1);
        let palette = Palette::new("Empty", DEFAULT_BACKGROUND, &[]);
        assert_eq!(palette.random_color(&mut rng), INDIGO);
    }

    #[test]
    fn test_builtin_tables() {
        assert_eq!(professional_palettes().len(), 4);
        assert_eq!(morphing_palettes().len(), 5);
        assert!(professional_palettes().iter().all(|p| p.particles.len() == 4));
    }
}
