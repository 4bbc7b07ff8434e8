use crate::color::Rgb;
use crate::easing::Ease;
use crate::palette::Palette;
use crate::timeline::Tween;
use rand::Rng;
use std::f32::consts::TAU;

pub const OPACITY_MIN: f32 = 0.2;
pub const OPACITY_MAX: f32 = 0.8;

/// Phase advance per frame
const WAVE_STEP: f32 = 0.02;
const WAVE_AMPLITUDE_X: f32 = 0.5;
const WAVE_AMPLITUDE_Y: f32 = 0.3;

/// In-flight color change of one particle
#[derive(Debug, Clone)]
pub struct ColorTransition {
    pub from: Rgb,
    pub target: Rgb,
    tween: Tween,
}

impl ColorTransition {
    pub fn new(from: Rgb, target: Rgb, duration: f32) -> Self {
        Self {
            from,
            target,
            tween: Tween::new(0.0, 1.0, duration, Ease::Power2InOut),
        }
    }

    pub fn current(&self) -> Rgb {
        self.from.lerp(self.target, self.tween.value())
    }
}

/// One glowing point of the field
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub size: f32,
    pub color: Rgb,
    pub transition: Option<ColorTransition>,
    pub opacity: f32,
    pub wave_offset: f32,
}

impl Particle {
    pub fn new<R: Rng>(rng: &mut R, width: f32, height: f32, palette: &Palette) -> Self {
        let mut particle = Self {
            x: 0.0,
            y: 0.0,
            speed_x: 0.0,
            speed_y: 0.0,
            size: 1.0,
            color: palette.random_color(rng),
            transition: None,
            opacity: OPACITY_MIN,
            wave_offset: 0.0,
        };
        particle.reset(rng, width, height, palette);
        particle
    }

    /// Reinitialize kinematic state and color in place
    pub fn reset<R: Rng>(&mut self, rng: &mut R, width: f32, height: f32, palette: &Palette) {
        self.x = rng.gen::<f32>() * width;
        self.y = rng.gen::<f32>() * height;
        self.size = rng.gen::<f32>() * 3.0 + 1.0;
        self.speed_x = rng.gen::<f32>() * 2.0 - 1.0;
        self.speed_y = rng.gen::<f32>() * 2.0 - 1.0;
        self.color = palette.random_color(rng);
        self.transition = None;
        self.opacity = rng.gen::<f32>() * (OPACITY_MAX - OPACITY_MIN) + OPACITY_MIN;
        self.wave_offset = rng.gen::<f32>() * TAU;
    }

    /// Drift by velocity plus the wave perturbation
    pub fn advance_wave(&mut self) {
        self.wave_offset += WAVE_STEP;
        self.x += self.speed_x + self.wave_offset.cos() * WAVE_AMPLITUDE_X;
        self.y += self.speed_y + self.wave_offset.sin() * WAVE_AMPLITUDE_Y;
    }

    /// Reflect off the surface edges, losing `damping` of the speed, and clamp inside
    pub fn bounce(&mut self, width: f32, height: f32, damping: f32) {
        if self.x > width || self.x < 0.0 {
            self.speed_x *= -damping;
            self.x = self.x.clamp(0.0, width);
        }
        if self.y > height || self.y < 0.0 {
            self.speed_y *= -damping;
            self.y = self.y.clamp(0.0, height);
        }
    }

    /// Fade towards the edges: normalized distance to the nearest edge, bounded to
    /// `OPACITY_MIN..=OPACITY_MAX`
    pub fn refresh_opacity(&mut self, width: f32, height: f32, fade_distance: f32) {
        let nearest = self
            .x
            .min(width - self.x)
            .min(self.y)
            .min(height - self.y);
        let normalized = if fade_distance > 0.0 {
            nearest / fade_distance
        } else {
            OPACITY_MAX
        };
        self.opacity = normalized.clamp(OPACITY_MIN, OPACITY_MAX);
    }

    /// Start blending towards `target`, from whatever color is shown right now
    pub fn retarget_color(&mut self, target: Rgb, duration: f32) {
        let from = self.display_color();
        self.transition = Some(ColorTransition::new(from, target, duration));
    }

    /// Step the color transition by `dt` seconds
    pub fn advance_color(&mut self, dt: f32) {
        if let Some(transition) = &mut self.transition {
            transition.tween.advance(dt);
            if transition.tween.is_complete() {
                self.color = transition.target;
                self.transition = None;
            }
        }
    }

    /// Color to draw with this frame
    pub fn display_color(&self) -> Rgb {
        match &self.transition {
            Some(transition) => transition.current(),
            None => self.color,
        }
    }

    #[cfg(test)]
    /// Where the color is heading (the settled color when no transition is running)
    pub fn color_target(&self) -> Rgb {
        match &self.transition {
            Some(transition) => transition.target,
            None => self.color,
        }
    }
}
