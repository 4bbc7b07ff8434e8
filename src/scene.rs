use crate::color::Rgb;
use crate::easing::Ease;
use crate::field::ParticleField;
use crate::host::{Host, OwnedResources, SurfaceEvent, TerminalHost};
use crate::palette::{GradientSpec, Palette, DEFAULT_BACKGROUND};
use crate::settings::{BackdropMode, FieldSettings};
use crate::shapes::{ShapeDescriptor, ShapeField, ShapeStyle};
use crate::surface::Surface;
use crate::timeline::CycleTimeline;
use rand::rngs::StdRng;

/// Seconds each gradient of the morphing backdrop is held
pub const MORPH_STEP_SECS: f32 = 5.0;

/// Soft color spots laid over the particle backdrop: center as a fraction of the surface,
/// color and center opacity
const OVERLAY_SPOTS: [(f32, f32, Rgb, f32); 2] = [
    (0.2, 0.8, Rgb::new(120, 119, 198), 0.3),
    (0.8, 0.2, Rgb::new(255, 119, 198), 0.15),
];

/// Gradient-only backdrop cycling through a list of gradients
pub struct MorphingGradient<H: Host> {
    host: H,
    gradients: Vec<GradientSpec>,
    cycle: CycleTimeline,
    resources: OwnedResources,
    active: bool,
}

impl<H: Host> MorphingGradient<H> {
    pub fn mount(host: H, gradients: Vec<GradientSpec>, step_secs: f32) -> Result<Self, String> {
        if gradients.is_empty() {
            return Err("Morphing backdrop needs at least one gradient".to_string());
        }
        let cycle = CycleTimeline::new(gradients.len(), step_secs, Ease::SineInOut);
        let mut backdrop = Self {
            host,
            gradients,
            cycle,
            resources: OwnedResources::default(),
            active: true,
        };
        backdrop.resources.schedule_frame(&mut backdrop.host);
        log::debug!("morphing backdrop mounted with {} gradients", backdrop.gradients.len());
        Ok(backdrop)
    }

    pub fn frame(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.resources.frame_fired();
        self.cycle.advance(dt);
        self.resources.schedule_frame(&mut self.host);
    }

    pub fn background(&self) -> GradientSpec {
        let position = self.cycle.position();
        let last = self.gradients.len() - 1;
        let from = &self.gradients[position.previous.min(last)];
        let to = &self.gradients[position.step.min(last)];
        from.lerp(to, position.progress)
    }

    /// False once torn down
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Index of the gradient being morphed towards
    pub fn current_step(&self) -> usize {
        self.cycle.position().step
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn teardown(&mut self) {
        self.active = false;
        self.resources.release(&mut self.host);
        self.cycle.kill();
    }
}

impl<H: Host> Drop for MorphingGradient<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// One-line description of what a scene is showing
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStatus {
    pub mode: BackdropMode,
    pub detail: String,
    pub particles: usize,
}

/// The mounted backdrop, driven by the terminal run loop
pub enum Scene {
    Particles(ParticleField<TerminalHost>),
    Morphing(MorphingGradient<TerminalHost>),
    Shapes(ShapeField<TerminalHost>, BackdropMode),
}

impl Scene {
    pub fn mount(
        mode: BackdropMode,
        width: u32,
        height: u32,
        settings: &FieldSettings,
        palettes: Vec<Palette>,
        mut rng: StdRng,
    ) -> Result<Self, String> {
        let host = TerminalHost::new(width, height);
        let scene = match mode {
            BackdropMode::Professional => {
                Scene::Particles(ParticleField::mount(host, settings.clone(), palettes, rng)?)
            }
            BackdropMode::Morphing => {
                let gradients = palettes.into_iter().map(|p| p.background).collect();
                Scene::Morphing(MorphingGradient::mount(host, gradients, MORPH_STEP_SECS)?)
            }
            BackdropMode::Animated => {
                Scene::Shapes(ShapeField::mount(host, ShapeStyle::Drifting, &mut rng), mode)
            }
            BackdropMode::Interactive => {
                Scene::Shapes(ShapeField::mount(host, ShapeStyle::Parallax, &mut rng), mode)
            }
        };
        Ok(scene)
    }

    pub fn mode(&self) -> BackdropMode {
        match self {
            Scene::Particles(_) => BackdropMode::Professional,
            Scene::Morphing(_) => BackdropMode::Morphing,
            Scene::Shapes(_, mode) => *mode,
        }
    }

    pub fn host(&self) -> &TerminalHost {
        match self {
            Scene::Particles(field) => field.host(),
            Scene::Morphing(backdrop) => backdrop.host(),
            Scene::Shapes(shapes, _) => shapes.host(),
        }
    }

    fn host_mut(&mut self) -> &mut TerminalHost {
        match self {
            Scene::Particles(field) => field.host_mut(),
            Scene::Morphing(backdrop) => backdrop.host_mut(),
            Scene::Shapes(shapes, _) => shapes.host_mut(),
        }
    }

    /// Hand an event to the scene if it subscribed to that kind.
    ///
    /// Resizes always update the host's surface size.
    pub fn deliver(&mut self, event: SurfaceEvent) {
        if let SurfaceEvent::Resize { width, height } = event {
            self.host_mut().set_surface_size(width, height);
        }
        if !self.host().is_subscribed(event.kind()) {
            return;
        }
        match self {
            Scene::Particles(field) => field.dispatch(event),
            Scene::Morphing(_) => {}
            Scene::Shapes(shapes, _) => shapes.dispatch(event),
        }
    }

    /// Run the frame callback if one is pending. Returns whether it ran.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.host_mut().take_frame() {
            return false;
        }
        match self {
            Scene::Particles(field) => field.frame(dt),
            Scene::Morphing(backdrop) => backdrop.frame(dt),
            Scene::Shapes(shapes, _) => shapes.frame(dt),
        }
        true
    }

    pub fn background(&self) -> GradientSpec {
        match self {
            Scene::Particles(field) => field.background(),
            Scene::Morphing(backdrop) => backdrop.background(),
            Scene::Shapes(..) => DEFAULT_BACKGROUND,
        }
    }

    /// Draw the full backdrop into `out`, resized to the host's surface
    pub fn compose_into(&self, out: &mut Surface) {
        let (width, height) = self.host().surface_size();
        out.resize(width, height);
        if out.is_degenerate() {
            return;
        }
        let (w, h) = (width as f32, height as f32);
        let gradient = self.background();
        out.fill_with(|x, y| gradient.color_at(x, y, w, h));

        match self {
            Scene::Particles(field) => {
                out.composite(field.surface());
                draw_overlay_spots(out);
            }
            Scene::Morphing(_) => {}
            Scene::Shapes(shapes, _) => {
                for shape in shapes.descriptors() {
                    draw_shape(out, &shape);
                }
            }
        }
    }

    /// Swap field tunables. Only the particle backdrop uses them.
    pub fn set_settings(&mut self, settings: &FieldSettings) {
        if let Scene::Particles(field) = self {
            field.set_settings(settings.clone());
        }
    }

    pub fn status(&self) -> SceneStatus {
        let mode = self.mode();
        match self {
            Scene::Particles(field) => SceneStatus {
                mode,
                detail: field.palette().name.clone(),
                particles: field.particles().len(),
            },
            Scene::Morphing(backdrop) => SceneStatus {
                mode,
                detail: format!("gradient {}", backdrop.current_step() + 1),
                particles: 0,
            },
            Scene::Shapes(shapes, _) => {
                let kind = match shapes.style() {
                    ShapeStyle::Drifting => "drifting",
                    ShapeStyle::Parallax => "floating",
                };
                SceneStatus {
                    mode,
                    detail: format!("{} {} shapes", shapes.descriptors().len(), kind),
                    particles: 0,
                }
            }
        }
    }

    /// False once the scene has been torn down
    pub fn is_active(&self) -> bool {
        match self {
            Scene::Particles(field) => field.is_active(),
            Scene::Morphing(backdrop) => backdrop.is_active(),
            Scene::Shapes(shapes, _) => shapes.is_active(),
        }
    }

    pub fn teardown(&mut self) {
        match self {
            Scene::Particles(field) => field.teardown(),
            Scene::Morphing(backdrop) => backdrop.teardown(),
            Scene::Shapes(shapes, _) => shapes.teardown(),
        }
    }
}

/// Radial spots fading to transparent at half the distance to the farthest corner
fn draw_overlay_spots(out: &mut Surface) {
    let (w, h) = (out.width() as f32, out.height() as f32);
    for (fx, fy, color, alpha) in OVERLAY_SPOTS {
        let cx = fx * w;
        let cy = fy * h;
        let far_x = cx.max(w - cx);
        let far_y = cy.max(h - cy);
        let radius = 0.5 * (far_x * far_x + far_y * far_y).sqrt();
        out.radial_glow(cx, cy, radius, color, alpha);
    }
}

fn draw_shape(out: &mut Surface, shape: &ShapeDescriptor) {
    out.fill_region(shape.cx, shape.cy, shape.reach(), shape.color, |x, y| {
        shape.opacity * shape.coverage(x, y)
    });
}
