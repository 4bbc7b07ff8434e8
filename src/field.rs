use crate::color::WHITE;
use crate::easing::Ease;
use crate::host::{Host, HostEvent, OwnedResources, SurfaceEvent};
use crate::palette::{GradientSpec, Palette};
use crate::particle::Particle;
use crate::settings::FieldSettings;
use crate::surface::Surface;
use crate::timeline::CycleTimeline;
use rand::rngs::StdRng;

/// Glow radius as a multiple of the particle radius
const GLOW_SCALE: f32 = 3.0;

/// Last known pointer position, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

/// A line to draw between two nearby particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub opacity: f32,
}

/// Every unordered pair closer than `threshold`, with opacity falling linearly from
/// `base_opacity` at distance 0 to nothing at `threshold`. O(n²).
pub fn connections(particles: &[Particle], threshold: f32, base_opacity: f32) -> Vec<Connection> {
    let mut lines = Vec::new();
    if threshold <= 0.0 {
        return lines;
    }
    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            let dx = a.x - b.x;
            let dy = a.y - b.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance < threshold {
                lines.push(Connection {
                    from: (a.x, a.y),
                    to: (b.x, b.y),
                    opacity: base_opacity * (1.0 - distance / threshold),
                });
            }
        }
    }
    lines
}

/// Displacement pushing a point at `(x, y)` away from the pointer.
///
/// Magnitude is `push * (radius - distance) / radius` inside the radius and zero outside.
/// A point exactly under the pointer is pushed along -x.
pub fn repulsion(x: f32, y: f32, pointer: Pointer, radius: f32, push: f32) -> (f32, f32) {
    let dx = pointer.x - x;
    let dy = pointer.y - y;
    let distance = (dx * dx + dy * dy).sqrt();
    if radius <= 0.0 || distance >= radius {
        return (0.0, 0.0);
    }
    let force = (radius - distance) / radius;
    let angle = dy.atan2(dx);
    (-angle.cos() * force * push, -angle.sin() * force * push)
}

/// The particle field simulation.
///
/// Owns its drawing surface, its particles and its palette timeline. Everything obtained
/// from the host is released by [`ParticleField::teardown`], which also runs on drop.
pub struct ParticleField<H: Host> {
    host: H,
    surface: Surface,
    particles: Vec<Particle>,
    palettes: Vec<Palette>,
    current_palette: usize,
    cycle: CycleTimeline,
    pointer: Option<Pointer>,
    settings: FieldSettings,
    rng: StdRng,
    resources: OwnedResources,
    /// Particles are created on the first non-degenerate surface
    seeded: bool,
    active: bool,
}

impl<H: Host> ParticleField<H> {
    /// Acquire a surface from `host`, create the particles and start listening.
    ///
    /// Fails without subscribing to anything when the surface cannot be acquired.
    pub fn mount(
        host: H,
        settings: FieldSettings,
        palettes: Vec<Palette>,
        rng: StdRng,
    ) -> Result<Self, String> {
        if palettes.is_empty() {
            return Err("Particle field needs at least one palette".to_string());
        }
        let (width, height) = host.surface_size();
        let surface = Surface::acquire(width, height)?;
        let cycle = CycleTimeline::new(palettes.len(), settings.palette_step_secs, Ease::SineInOut);

        let mut field = Self {
            host,
            surface,
            particles: Vec::new(),
            palettes,
            current_palette: 0,
            cycle,
            pointer: None,
            settings,
            rng,
            resources: OwnedResources::default(),
            seeded: false,
            active: true,
        };
        field.seed_particles();

        for event in [HostEvent::Resize, HostEvent::PointerMove, HostEvent::PointerLeave] {
            field.resources.subscribe(&mut field.host, event);
        }
        field.resources.schedule_frame(&mut field.host);

        log::debug!(
            "particle field mounted on {}x{} with {} particles",
            width,
            height,
            field.particles.len()
        );
        Ok(field)
    }

    fn seed_particles(&mut self) {
        if self.seeded || self.surface.is_degenerate() {
            return;
        }
        let (width, height) = (self.surface.width(), self.surface.height());
        let count = self.settings.particle_count(width, height);
        let palette = &self.palettes[self.current_palette];
        let rng = &mut self.rng;
        self.particles = (0..count)
            .map(|_| Particle::new(rng, width as f32, height as f32, palette))
            .collect();
        self.seeded = true;
    }

    /// Route a host notification
    pub fn dispatch(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Resize { width, height } => self.resize(width, height),
            SurfaceEvent::PointerMove { x, y } => self.on_pointer_move(x, y),
            SurfaceEvent::PointerLeave => self.on_pointer_leave(),
        }
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.active && x.is_finite() && y.is_finite() {
            self.pointer = Some(Pointer { x, y });
        }
    }

    pub fn on_pointer_leave(&mut self) {
        self.pointer = None;
    }

    /// Change surface dimensions. Particles keep their state; the next bounce uses the new
    /// bounds.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.active {
            self.surface.resize(width, height);
        }
    }

    /// One frame callback: palette timeline, color transitions, update, render, reschedule
    pub fn frame(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.resources.frame_fired();

        if let Some(step) = self.cycle.advance(dt) {
            self.apply_palette(step);
        }
        for particle in &mut self.particles {
            particle.advance_color(dt);
        }

        if !self.surface.is_degenerate() {
            self.seed_particles();
            self.update();
            self.render();
        }

        self.resources.schedule_frame(&mut self.host);
    }

    /// Make palette `index` current and send every particle towards a random color of it
    pub fn apply_palette(&mut self, index: usize) {
        let Some(palette) = self.palettes.get(index) else {
            return;
        };
        self.current_palette = index;
        for particle in &mut self.particles {
            let target = palette.random_color(&mut self.rng);
            particle.retarget_color(target, self.settings.color_transition_secs);
        }
        log::debug!("palette step {} ({})", index, palette.name);
    }

    /// Advance every particle one frame. Skipped on a degenerate surface.
    pub fn update(&mut self) {
        if self.surface.is_degenerate() {
            return;
        }
        let width = self.surface.width() as f32;
        let height = self.surface.height() as f32;
        let settings = &self.settings;

        for particle in &mut self.particles {
            particle.advance_wave();

            if let Some(pointer) = self.pointer {
                let (dx, dy) = repulsion(
                    particle.x,
                    particle.y,
                    pointer,
                    settings.pointer_radius,
                    settings.push_factor,
                );
                particle.x += dx;
                particle.y += dy;
            }

            particle.bounce(width, height, settings.bounce_damping);
            particle.refresh_opacity(width, height, settings.edge_fade_distance);
        }
    }

    /// Redraw the surface: glows and cores, connection lines, then the noise pass
    pub fn render(&mut self) {
        if self.surface.is_degenerate() {
            return;
        }
        self.surface.clear();

        for particle in &self.particles {
            let color = particle.display_color();
            self.surface.radial_glow(
                particle.x,
                particle.y,
                particle.size * GLOW_SCALE,
                color,
                particle.opacity,
            );
            self.surface
                .fill_disc(particle.x, particle.y, particle.size, color, particle.opacity);
        }

        let lines = connections(
            &self.particles,
            self.settings.connection_threshold,
            self.settings.connection_opacity,
        );
        for line in lines {
            self.surface
                .stroke_line(line.from.0, line.from.1, line.to.0, line.to.1, WHITE, line.opacity);
        }

        self.surface.apply_noise(
            &mut self.rng,
            self.settings.noise_probability,
            self.settings.noise_magnitude,
        );
    }

    /// Background gradient for the current point of the palette cycle
    pub fn background(&self) -> GradientSpec {
        let position = self.cycle.position();
        let from = &self.palettes[position.previous.min(self.palettes.len() - 1)];
        let to = &self.palettes[position.step.min(self.palettes.len() - 1)];
        from.background.lerp(&to.background, position.progress)
    }

    /// Swap tunables at runtime. Particle count stays as seeded.
    pub fn set_settings(&mut self, settings: FieldSettings) {
        self.cycle.set_step_duration(settings.palette_step_secs);
        self.settings = settings;
    }

    /// Stop advancing and give back subscriptions, the pending frame and the palette
    /// timeline. Idempotent.
    pub fn teardown(&mut self) {
        let was_active = self.active;
        self.active = false;
        self.resources.release(&mut self.host);
        self.cycle.kill();
        self.pointer = None;
        if was_active {
            log::debug!("particle field torn down");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    #[cfg(test)]
    pub fn pointer(&self) -> Option<Pointer> {
        self.pointer
    }

    pub fn palette(&self) -> &Palette {
        &self.palettes[self.current_palette]
    }

    #[cfg(test)]
    pub fn current_palette(&self) -> usize {
        self.current_palette
    }

    #[cfg(test)]
    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: Host> Drop for ParticleField<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
