use serde::{Deserialize, Serialize};

/// Which background scene is shown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BackdropMode {
    /// Palette-cycled gradient with the particle field on top
    #[default]
    Professional,
    /// Gradient-only cycle
    Morphing,
    /// Drifting blurred shapes
    Animated,
    /// Blurred circles with pointer parallax
    Interactive,
}

impl BackdropMode {
    pub fn name(&self) -> &str {
        match self {
            BackdropMode::Professional => "Particles",
            BackdropMode::Morphing => "Morphing",
            BackdropMode::Animated => "Animated",
            BackdropMode::Interactive => "Interactive",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            BackdropMode::Professional => BackdropMode::Morphing,
            BackdropMode::Morphing => BackdropMode::Animated,
            BackdropMode::Animated => BackdropMode::Interactive,
            BackdropMode::Interactive => BackdropMode::Professional,
        }
    }

    #[cfg(test)]
    pub fn prev(&self) -> Self {
        match self {
            BackdropMode::Professional => BackdropMode::Interactive,
            BackdropMode::Morphing => BackdropMode::Professional,
            BackdropMode::Animated => BackdropMode::Morphing,
            BackdropMode::Interactive => BackdropMode::Animated,
        }
    }
}

/// Tunables of the particle field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    // === Population ===
    /// Upper bound on particle count (10-200)
    pub max_particles: usize,
    /// Surface area per particle in square pixels (5000-100000)
    pub area_per_particle: f32,

    // === Motion ===
    /// Velocity kept (and inverted) on an edge bounce (0.1-1.0)
    pub bounce_damping: f32,
    /// Distance over which particles fade near the edges (10-400)
    pub edge_fade_distance: f32,

    // === Pointer ===
    /// Pointer influence radius (0-500)
    pub pointer_radius: f32,
    /// Displacement at zero distance from the pointer (0-20)
    pub push_factor: f32,

    // === Rendering ===
    /// Maximum distance for a connection line (0-300)
    pub connection_threshold: f32,
    /// Opacity of a connection line between touching particles (0.0-1.0)
    pub connection_opacity: f32,
    /// Fraction of pixels jittered by the noise pass (0.0-0.1)
    pub noise_probability: f32,
    /// Max per-channel noise offset (0-50)
    pub noise_magnitude: f32,

    // === Palette timeline ===
    /// Seconds each palette stays active (1-60)
    pub palette_step_secs: f32,
    /// Seconds for a particle to blend to its new color (0-30)
    pub color_transition_secs: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            max_particles: 80,
            area_per_particle: 20_000.0,

            bounce_damping: 0.9,
            edge_fade_distance: 100.0,

            pointer_radius: 150.0,
            push_factor: 5.0,

            connection_threshold: 120.0,
            connection_opacity: 0.1,
            noise_probability: 0.01,
            noise_magnitude: 5.0,

            palette_step_secs: 8.0,
            color_transition_secs: 4.0,
        }
    }
}

impl FieldSettings {
    /// Clamp every field into its documented range. Non-finite values fall back to the default.
    pub fn clamped(mut self) -> Self {
        let d = Self::default();
        self.max_particles = self.max_particles.clamp(10, 200);
        self.area_per_particle = finite_or(self.area_per_particle, d.area_per_particle).clamp(5_000.0, 100_000.0);
        self.bounce_damping = finite_or(self.bounce_damping, d.bounce_damping).clamp(0.1, 1.0);
        self.edge_fade_distance = finite_or(self.edge_fade_distance, d.edge_fade_distance).clamp(10.0, 400.0);
        self.pointer_radius = finite_or(self.pointer_radius, d.pointer_radius).clamp(0.0, 500.0);
        self.push_factor = finite_or(self.push_factor, d.push_factor).clamp(0.0, 20.0);
        self.connection_threshold =
            finite_or(self.connection_threshold, d.connection_threshold).clamp(0.0, 300.0);
        self.connection_opacity = finite_or(self.connection_opacity, d.connection_opacity).clamp(0.0, 1.0);
        self.noise_probability = finite_or(self.noise_probability, d.noise_probability).clamp(0.0, 0.1);
        self.noise_magnitude = finite_or(self.noise_magnitude, d.noise_magnitude).clamp(0.0, 50.0);
        self.palette_step_secs = finite_or(self.palette_step_secs, d.palette_step_secs).clamp(1.0, 60.0);
        self.color_transition_secs =
            finite_or(self.color_transition_secs, d.color_transition_secs).clamp(0.0, 30.0);
        self
    }

    /// Number of particles for a `width` x `height` surface
    pub fn particle_count(&self, width: u32, height: u32) -> usize {
        if self.area_per_particle <= 0.0 {
            return 0;
        }
        let area = width as f64 * height as f64;
        let by_area = (area / self.area_per_particle as f64).floor() as usize;
        by_area.min(self.max_particles)
    }

    pub fn adjust_bounce_damping(&mut self, delta: f32) {
        self.bounce_damping = (self.bounce_damping + delta).clamp(0.1, 1.0);
    }

    pub fn adjust_pointer_radius(&mut self, delta: f32) {
        self.pointer_radius = (self.pointer_radius + delta).clamp(0.0, 500.0);
    }

    pub fn adjust_push_factor(&mut self, delta: f32) {
        self.push_factor = (self.push_factor + delta).clamp(0.0, 20.0);
    }

    pub fn adjust_connection_threshold(&mut self, delta: f32) {
        self.connection_threshold = (self.connection_threshold + delta).clamp(0.0, 300.0);
    }

    pub fn adjust_noise_probability(&mut self, delta: f32) {
        self.noise_probability = (self.noise_probability + delta).clamp(0.0, 0.1);
    }

    pub fn adjust_palette_step(&mut self, delta: f32) {
        self.palette_step_secs = (self.palette_step_secs + delta).clamp(1.0, 60.0);
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
