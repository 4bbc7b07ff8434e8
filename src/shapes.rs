use crate::color::{hex, Rgb};
use crate::easing::Ease;
use crate::host::{Host, HostEvent, OwnedResources, SurfaceEvent};
use crate::timeline::{ping_pong, Tween};
use rand::Rng;

const DRIFTING_COLORS: [Rgb; 5] = [
    hex(0x667eea),
    hex(0x764ba2),
    hex(0xf093fb),
    hex(0x4facfe),
    hex(0x43e97b),
];

const PARALLAX_COLORS: [Rgb; 5] = [
    hex(0xff6b6b),
    hex(0x4ecdc4),
    hex(0x45b7d1),
    hex(0x96ceb4),
    hex(0xfeca57),
];

/// Seconds for the parallax offset to reach a new pointer target
const PARALLAX_SECS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Circle,
    /// Square with corners rounded to 20% of the side
    RoundedSquare,
}

/// How a shape field behaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeStyle {
    /// 15 shapes wandering, turning and breathing on yoyo timelines
    Drifting,
    /// 10 soft circles floating, offset towards the pointer by a per-shape parallax
    Parallax,
}

/// A decorative shape resolved for the current instant, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDescriptor {
    pub cx: f32,
    pub cy: f32,
    /// Side length or diameter, scale applied
    pub size: f32,
    pub kind: ShapeKind,
    /// Degrees, clockwise
    pub rotation: f32,
    pub color: Rgb,
    pub opacity: f32,
    /// Width of the soft edge
    pub blur: f32,
}

impl ShapeDescriptor {
    /// Signed distance from `(x, y)` to the outline, negative inside
    pub fn signed_distance(&self, x: f32, y: f32) -> f32 {
        let dx = x - self.cx;
        let dy = y - self.cy;
        let half = self.size / 2.0;
        match self.kind {
            ShapeKind::Circle => (dx * dx + dy * dy).sqrt() - half,
            ShapeKind::RoundedSquare => {
                let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
                let lx = (dx * cos - dy * sin).abs();
                let ly = (dx * sin + dy * cos).abs();
                let corner = self.size * 0.2;
                let qx = lx - half + corner;
                let qy = ly - half + corner;
                let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
                outside + qx.max(qy).min(0.0) - corner
            }
        }
    }

    /// Fraction (0..=1) of the shape's opacity that reaches pixel `(x, y)`
    pub fn coverage(&self, x: f32, y: f32) -> f32 {
        let softness = self.blur.max(1.0);
        (0.5 - self.signed_distance(x, y) / (2.0 * softness)).clamp(0.0, 1.0)
    }

    /// Half-extent of the box that can receive any coverage
    pub fn reach(&self) -> f32 {
        // The rotated square's corner stays within half a diagonal
        self.size * std::f32::consts::FRAC_1_SQRT_2 + self.blur.max(1.0)
    }
}

/// One animated shape and its timelines
#[derive(Debug, Clone)]
struct FloatingShape {
    /// Anchor, as a fraction of the surface
    left: f32,
    top: f32,
    size: f32,
    kind: ShapeKind,
    color: Rgb,
    opacity: f32,
    blur: f32,
    drift_x: Tween,
    drift_y: Tween,
    spin: Tween,
    scale: Tween,
    /// Timeline length swept forwards and backwards; `None` means the delay only applies once
    yoyo_period: Option<f32>,
    parallax_x: Tween,
    parallax_y: Tween,
}

impl FloatingShape {
    fn drifting<R: Rng>(rng: &mut R, index: usize) -> Self {
        let size = rng.gen::<f32>() * 100.0 + 50.0;
        let color = DRIFTING_COLORS[rng.gen_range(0..DRIFTING_COLORS.len())];
        let kind = if rng.gen::<f32>() > 0.5 {
            ShapeKind::Circle
        } else {
            ShapeKind::RoundedSquare
        };
        let opacity = rng.gen::<f32>() * 0.3 + 0.1;
        let blur = rng.gen::<f32>() * 20.0 + 5.0;
        let left = rng.gen::<f32>();
        let top = rng.gen::<f32>();

        let delay = index as f32 * 0.5;
        let move_secs = rng.gen::<f32>() * 10.0 + 10.0;
        let drift_x = Tween::new(0.0, rng.gen::<f32>() * 200.0 - 100.0, move_secs, Ease::SineInOut)
            .with_delay(delay);
        let drift_y = Tween::new(0.0, rng.gen::<f32>() * 200.0 - 100.0, move_secs, Ease::SineInOut)
            .with_delay(delay);
        let spin = Tween::new(0.0, rng.gen::<f32>() * 360.0, move_secs, Ease::SineInOut)
            .with_delay(delay);
        let scale_secs = rng.gen::<f32>() * 5.0 + 5.0;
        let scale = Tween::new(1.0, rng.gen::<f32>() * 0.5 + 0.8, scale_secs, Ease::Power1InOut);
        let period = drift_x.end_time().max(scale.end_time());

        Self {
            left,
            top,
            size,
            kind,
            color,
            opacity,
            blur,
            drift_x,
            drift_y,
            spin,
            scale,
            yoyo_period: Some(period),
            parallax_x: Tween::new(0.0, 0.0, 0.0, Ease::Power2Out),
            parallax_y: Tween::new(0.0, 0.0, 0.0, Ease::Power2Out),
        }
    }

    fn floating<R: Rng>(rng: &mut R, index: usize) -> Self {
        let size = rng.gen::<f32>() * 100.0 + 50.0;
        let color = PARALLAX_COLORS[rng.gen_range(0..PARALLAX_COLORS.len())];
        let left = rng.gen::<f32>();
        let top = rng.gen::<f32>();

        let delay = index as f32 * 0.5;
        let float_secs = rng.gen::<f32>() * 20.0 + 10.0;
        let drift_x = Tween::new(0.0, rng.gen::<f32>() * 100.0 - 50.0, float_secs, Ease::SineInOut)
            .with_delay(delay);
        let drift_y = Tween::new(0.0, rng.gen::<f32>() * 100.0 - 50.0, float_secs, Ease::SineInOut)
            .with_delay(delay);
        let spin = Tween::new(0.0, 360.0, float_secs, Ease::SineInOut).with_delay(delay);

        Self {
            left,
            top,
            size,
            kind: ShapeKind::Circle,
            color,
            opacity: 0.15,
            blur: 30.0,
            drift_x,
            drift_y,
            spin,
            scale: Tween::new(1.0, 1.0, 0.0, Ease::Linear),
            yoyo_period: None,
            parallax_x: Tween::new(0.0, 0.0, 0.0, Ease::Power2Out),
            parallax_y: Tween::new(0.0, 0.0, 0.0, Ease::Power2Out),
        }
    }

    /// Local timeline time for an absolute elapsed time
    fn local_time(&self, elapsed: f32) -> f32 {
        match self.yoyo_period {
            Some(period) => ping_pong(elapsed, period),
            None => {
                let delay = self.drift_x.delay;
                if elapsed < delay {
                    0.0
                } else {
                    delay + ping_pong(elapsed - delay, self.drift_x.duration)
                }
            }
        }
    }

    fn descriptor(&self, elapsed: f32, width: f32, height: f32) -> ShapeDescriptor {
        let t = self.local_time(elapsed);
        ShapeDescriptor {
            cx: self.left * width + self.drift_x.value_at(t) + self.parallax_x.value(),
            cy: self.top * height + self.drift_y.value_at(t) + self.parallax_y.value(),
            size: self.size * self.scale.value_at(t),
            kind: self.kind,
            rotation: self.spin.value_at(t),
            color: self.color,
            opacity: self.opacity,
            blur: self.blur,
        }
    }
}

/// Declarative floating-shape background.
///
/// Holds only shape state; drawing the descriptors is left to whoever composes the frame.
pub struct ShapeField<H: Host> {
    host: H,
    style: ShapeStyle,
    shapes: Vec<FloatingShape>,
    width: u32,
    height: u32,
    elapsed: f32,
    resources: OwnedResources,
    active: bool,
}

impl<H: Host> ShapeField<H> {
    pub fn mount<R: Rng>(host: H, style: ShapeStyle, rng: &mut R) -> Self {
        let (width, height) = host.surface_size();
        let shapes = match style {
            ShapeStyle::Drifting => (0..15).map(|i| FloatingShape::drifting(rng, i)).collect(),
            ShapeStyle::Parallax => (0..10).map(|i| FloatingShape::floating(rng, i)).collect(),
        };
        let mut field = Self {
            host,
            style,
            shapes,
            width,
            height,
            elapsed: 0.0,
            resources: OwnedResources::default(),
            active: true,
        };
        field.resources.subscribe(&mut field.host, HostEvent::Resize);
        if style == ShapeStyle::Parallax {
            field.resources.subscribe(&mut field.host, HostEvent::PointerMove);
        }
        field.resources.schedule_frame(&mut field.host);
        log::debug!("{:?} shape field mounted with {} shapes", style, field.shapes.len());
        field
    }

    pub fn dispatch(&mut self, event: SurfaceEvent) {
        if !self.active {
            return;
        }
        match event {
            SurfaceEvent::Resize { width, height } => {
                self.width = width;
                self.height = height;
            }
            SurfaceEvent::PointerMove { x, y } => self.on_pointer_move(x, y),
            SurfaceEvent::PointerLeave => {}
        }
    }

    /// Retarget every shape's parallax offset from the pointer's position in percent
    fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.style != ShapeStyle::Parallax || self.width == 0 || self.height == 0 {
            return;
        }
        let px = x / self.width as f32 * 100.0;
        let py = y / self.height as f32 * 100.0;
        for (index, shape) in self.shapes.iter_mut().enumerate() {
            let factor = index as f32 * 0.1;
            shape.parallax_x = Tween::new(
                shape.parallax_x.value(),
                (px - 50.0) * factor,
                PARALLAX_SECS,
                Ease::Power2Out,
            );
            shape.parallax_y = Tween::new(
                shape.parallax_y.value(),
                (py - 50.0) * factor,
                PARALLAX_SECS,
                Ease::Power2Out,
            );
        }
    }

    pub fn frame(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.resources.frame_fired();
        self.elapsed += dt.max(0.0);
        for shape in &mut self.shapes {
            shape.parallax_x.advance(dt);
            shape.parallax_y.advance(dt);
        }
        self.resources.schedule_frame(&mut self.host);
    }

    /// The shapes as they should be drawn right now
    pub fn descriptors(&self) -> Vec<ShapeDescriptor> {
        let (w, h) = (self.width as f32, self.height as f32);
        self.shapes
            .iter()
            .map(|shape| shape.descriptor(self.elapsed, w, h))
            .collect()
    }

    pub fn style(&self) -> ShapeStyle {
        self.style
    }

    #[cfg(test)]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Release host resources and drop every shape. Idempotent.
    pub fn teardown(&mut self) {
        self.active = false;
        self.resources.release(&mut self.host);
        self.shapes.clear();
    }
}

impl<H: Host> Drop for ShapeField<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TerminalHost;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shape(kind: ShapeKind, rotation: f32) -> ShapeDescriptor {
        ShapeDescriptor {
            cx: 100.0,
            cy: 100.0,
            size: 40.0,
            kind,
            rotation,
            color: Rgb::new(255, 255, 255),
            opacity: 0.5,
            blur: 4.0,
        }
    }

    #[test]
    fn test_circle_distance() {
        let circle = shape(ShapeKind::Circle, 0.0);
        assert!((circle.signed_distance(100.0, 100.0) + 20.0).abs() < 1e-5);
        assert!(circle.signed_distance(120.0, 100.0).abs() < 1e-5);
        assert_eq!(circle.coverage(100.0, 100.0), 1.0);
        assert!((circle.coverage(120.0, 100.0) - 0.5).abs() < 1e-5);
        assert_eq!(circle.coverage(140.0, 100.0), 0.0);
    }

    #[test]
    fn test_rounded_square_distance() {
        let square = shape(ShapeKind::RoundedSquare, 0.0);
        // Edge midpoint sits on the outline
        assert!(square.signed_distance(120.0, 100.0).abs() < 1e-4);
        // Corner is cut by the rounding
        assert!(square.signed_distance(119.5, 119.5) > 0.0);
        // Rotated 45 degrees the old edge midpoint is well inside
        let turned = shape(ShapeKind::RoundedSquare, 45.0);
        assert!(turned.signed_distance(120.0, 100.0) < 0.0);
    }

    #[test]
    fn test_reach_covers_soft_edge() {
        let square = shape(ShapeKind::RoundedSquare, 30.0);
        let r = square.reach();
        for (x, y) in [(100.0 + r, 100.0), (100.0, 100.0 - r), (100.0 + r, 100.0 + r)] {
            assert_eq!(square.coverage(x, y), 0.0);
        }
    }

    #[test]
    fn test_drifting_field_setup() {
        let mut rng = StdRng::seed_from_u64(8);
        let field = ShapeField::mount(TerminalHost::new(800, 600), ShapeStyle::Drifting, &mut rng);
        let shapes = field.descriptors();
        assert_eq!(shapes.len(), 15);
        for s in &shapes {
            assert!((50.0..150.0).contains(&s.size));
            assert!((0.1..0.4).contains(&s.opacity));
            assert!((5.0..25.0).contains(&s.blur));
            assert!(DRIFTING_COLORS.contains(&s.color));
        }
        assert!(field.host().is_subscribed(HostEvent::Resize));
        assert!(!field.host().is_subscribed(HostEvent::PointerMove));
    }

    #[test]
    fn test_drifting_shapes_move_and_return() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = ShapeField::mount(TerminalHost::new(800, 600), ShapeStyle::Drifting, &mut rng);
        let start = field.descriptors();
        field.frame(12.0);
        let later = field.descriptors();
        assert!(start.iter().zip(&later).any(|(a, b)| a.cx != b.cx));

        // A yoyo timeline is back at its start after two full sweeps
        let period = field.shapes[0].yoyo_period.unwrap();
        let mut fresh = ShapeField::mount(TerminalHost::new(800, 600), ShapeStyle::Drifting, &mut StdRng::seed_from_u64(9));
        fresh.frame(period * 2.0);
        let back = fresh.descriptors();
        assert!((back[0].cx - start[0].cx).abs() < 1e-2);
        assert!((back[0].size - start[0].size).abs() < 1e-2);
    }

    #[test]
    fn test_parallax_follows_pointer() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut field = ShapeField::mount(TerminalHost::new(1000, 1000), ShapeStyle::Parallax, &mut rng);
        assert!(field.host().is_subscribed(HostEvent::PointerMove));
        let before = field.descriptors();

        // Pointer at the right edge: 50% past center, so shape i moves 5 * i px
        field.dispatch(SurfaceEvent::PointerMove { x: 1000.0, y: 500.0 });
        field.frame(PARALLAX_SECS);
        let after = field.descriptors();

        // Shape 0 has no parallax and its float has not started (delay 0)
        // Shape 1 waits 0.5 s before floating; isolate parallax via shape 0 and 9 offsets
        let p9 = field.shapes[9].parallax_x.value();
        assert!((p9 - 45.0).abs() < 1e-3);
        assert_eq!(field.shapes[0].parallax_x.value(), 0.0);
        assert!(field.shapes[9].parallax_y.value().abs() < 1e-3);
        assert_eq!(before.len(), after.len());
    }

    #[test]
    fn test_teardown_releases_and_clears() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = ShapeField::mount(TerminalHost::new(300, 300), ShapeStyle::Parallax, &mut rng);
        field.teardown();
        field.teardown();
        assert_eq!(field.host().active_subscriptions(), 0);
        assert!(!field.host().has_pending_frame());
        assert!(field.descriptors().is_empty());
        field.frame(1.0);
        assert!(!field.host().has_pending_frame());
    }
}
