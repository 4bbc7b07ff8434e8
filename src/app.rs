use crate::blocks;
use crate::config::AppConfig;
use crate::export::{self, GifRecorder};
use crate::host::SurfaceEvent;
use crate::presets::{PaletteLibrary, PaletteSet};
use crate::scene::Scene;
use crate::settings::{BackdropMode, FieldSettings};
use crate::surface::Surface;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Bounce,
    Connections,
    Noise,
    PaletteStep,
    Push,
    Radius,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Bounce,
            Focus::Bounce => Focus::Connections,
            Focus::Connections => Focus::Noise,
            Focus::Noise => Focus::PaletteStep,
            Focus::PaletteStep => Focus::Push,
            Focus::Push => Focus::Radius,
            Focus::Radius => Focus::Bounce,
        }
    }

    /// Shift+Tab cycles through parameters in reverse alphabetical order
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Radius,
            Focus::Bounce => Focus::Radius,
            Focus::Connections => Focus::Bounce,
            Focus::Noise => Focus::Connections,
            Focus::PaletteStep => Focus::Noise,
            Focus::Push => Focus::PaletteStep,
            Focus::Radius => Focus::Push,
        }
    }

    /// Line index in the parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::Bounce => 0,
            Focus::Connections => 1,
            Focus::Noise => 2,
            Focus::PaletteStep => 3,
            Focus::Push => 4,
            Focus::Radius => 5,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    pub scene: Scene,
    /// Last composited frame, in surface pixels
    pub composed: Surface,
    pub library: PaletteLibrary,
    pub settings: FieldSettings,
    pub backdrop: BackdropMode,
    /// Explicitly chosen palette set; `None` follows the backdrop's default
    pub palette_set: Option<String>,
    pub seed: Option<u64>,
    rng: StdRng,
    pub canvas: (u16, u16),
    pub paused: bool,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    pub recorder: Option<GifRecorder>,
    /// Result of the last export, shown in the status box
    pub message: Option<String>,
}

impl App {
    pub fn new(
        config: AppConfig,
        library: PaletteLibrary,
        canvas_width: u16,
        canvas_height: u16,
    ) -> Result<Self, String> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let settings = config.settings.clamped();
        let palette_set = config.palette_set.filter(|name| library.find(name).is_some());
        let palettes = active_set(&library, palette_set.as_deref(), config.backdrop)
            .palettes
            .clone();
        let (width, height) = blocks::surface_size_for(canvas_width, canvas_height);
        let scene = Scene::mount(
            config.backdrop,
            width,
            height,
            &settings,
            palettes,
            StdRng::seed_from_u64(rng.gen()),
        )?;

        Ok(Self {
            scene,
            composed: Surface::acquire(0, 0)?,
            library,
            settings,
            backdrop: config.backdrop,
            palette_set,
            seed: config.seed,
            rng,
            canvas: (canvas_width, canvas_height),
            paused: false,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            recorder: None,
            message: None,
        })
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> AppConfig {
        AppConfig {
            settings: self.settings.clone(),
            backdrop: self.backdrop,
            palette_set: self.palette_set.clone(),
            seed: self.seed,
            ..Default::default()
        }
    }

    /// The palette set feeding the current backdrop
    pub fn active_set(&self) -> &PaletteSet {
        active_set(&self.library, self.palette_set.as_deref(), self.backdrop)
    }

    /// Advance the scene by `dt` seconds and recompose if a frame ran
    pub fn tick(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        if self.scene.tick(dt) {
            self.scene.compose_into(&mut self.composed);
            self.record_frame(dt);
        }
    }

    fn record_frame(&mut self, dt: f32) {
        let Some(recorder) = &mut self.recorder else {
            return;
        };
        if let Err(e) = recorder.offer_frame(self.composed.image(), dt) {
            log::warn!("{}", e);
            self.message = Some(e);
            self.recorder = None;
        }
    }

    /// Tear down the current scene and mount a fresh one for the current backdrop
    pub fn remount(&mut self) {
        self.scene.teardown();
        let palettes = self.active_set().palettes.clone();
        let (width, height) = blocks::surface_size_for(self.canvas.0, self.canvas.1);
        let rng = StdRng::seed_from_u64(self.rng.gen());
        match Scene::mount(self.backdrop, width, height, &self.settings, palettes, rng) {
            Ok(scene) => self.scene = scene,
            Err(e) => {
                log::warn!("{}", e);
                self.composed.resize(0, 0);
                self.message = Some(e);
            }
        }
    }

    pub fn cycle_backdrop(&mut self) {
        self.backdrop = self.backdrop.next();
        self.remount();
    }

    pub fn cycle_palette_set(&mut self) {
        let next = self.library.next_name(&self.active_set().name);
        self.palette_set = Some(next);
        self.remount();
    }

    /// Pointer over canvas cell (`col`, `row`), relative to the canvas origin
    pub fn pointer_move(&mut self, col: u16, row: u16) {
        let (x, y) = blocks::cell_to_surface(col, row);
        self.scene.deliver(SurfaceEvent::PointerMove { x, y });
    }

    pub fn pointer_leave(&mut self) {
        self.scene.deliver(SurfaceEvent::PointerLeave);
    }

    /// Resize the scene to match a new canvas size
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        if self.canvas == (canvas_width, canvas_height) {
            return;
        }
        self.canvas = (canvas_width, canvas_height);
        let (width, height) = blocks::surface_size_for(canvas_width, canvas_height);
        self.scene.deliver(SurfaceEvent::Resize { width, height });
    }

    /// Save the last composited frame as PNG
    pub fn snapshot(&mut self) {
        let path = export::timestamped_path("particle-field", "png");
        self.message = Some(match export::save_png(self.composed.image(), &path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => e,
        });
    }

    /// Write the current configuration next to the snapshots
    pub fn save_config(&mut self) {
        let path = export::timestamped_path("particle-field-config", "json");
        self.message = Some(match self.config().save_to_file(&path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => e,
        });
    }

    /// Start a GIF recording, or finish the running one
    pub fn toggle_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            let path = recorder.path().to_path_buf();
            self.message = Some(match recorder.finish() {
                Ok(frames) => format!("Saved {} ({} frames)", path.display(), frames),
                Err(e) => e,
            });
            return;
        }
        let path = export::timestamped_path("particle-field", "gif");
        match GifRecorder::create(&path, self.composed.width(), self.composed.height()) {
            Ok(recorder) => {
                self.message = Some("Recording GIF...".to_string());
                self.recorder = Some(recorder);
            }
            Err(e) => self.message = Some(e),
        }
    }

    /// Finish any running recording. Called on exit.
    pub fn finish_recording(&mut self) {
        if self.recorder.is_some() {
            self.toggle_recording();
        }
    }

    fn apply_settings(&mut self) {
        self.scene.set_settings(&self.settings);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1.0);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1.0);
    }

    fn adjust_focused(&mut self, sign: f32) {
        match self.focus {
            Focus::None | Focus::Controls => return,
            Focus::Bounce => self.settings.adjust_bounce_damping(0.05 * sign),
            Focus::Connections => self.settings.adjust_connection_threshold(10.0 * sign),
            Focus::Noise => self.settings.adjust_noise_probability(0.005 * sign),
            Focus::PaletteStep => self.settings.adjust_palette_step(1.0 * sign),
            Focus::Push => self.settings.adjust_push_factor(0.5 * sign),
            Focus::Radius => self.settings.adjust_pointer_radius(10.0 * sign),
        }
        self.apply_settings();
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }
}

fn active_set<'a>(
    library: &'a PaletteLibrary,
    chosen: Option<&str>,
    backdrop: BackdropMode,
) -> &'a PaletteSet {
    chosen
        .and_then(|name| library.find(name))
        .unwrap_or_else(|| library.default_for(backdrop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Host, HostEvent};

    fn app(backdrop: BackdropMode) -> App {
        let config = AppConfig {
            backdrop,
            seed: Some(5),
            ..Default::default()
        };
        App::new(config, PaletteLibrary::builtin_only(), 40, 12).unwrap()
    }

    #[test]
    fn test_failed_remount_blanks_canvas() {
        let mut app = app(BackdropMode::Professional);
        app.tick(1.0 / 60.0);
        assert!(app.composed.width() > 0);

        // 2100 cells are wider than any surface can be
        app.resize(2100, 12);
        app.remount();
        assert_eq!(app.composed.width(), 0);
        assert!(app.message.is_some());
        assert!(!app.scene.is_active());
    }

    #[test]
    fn test_focus_cycle() {
        let mut focus = Focus::Controls;
        for _ in 0..6 {
            focus = focus.next();
            assert!(focus.is_param());
            assert_eq!(focus.next().prev(), focus);
        }
        assert_eq!(focus, Focus::Radius);
        assert_eq!(focus.next(), Focus::Bounce);
    }

    #[test]
    fn test_tick_composes_surface() {
        let mut app = app(BackdropMode::Professional);
        app.tick(1.0 / 60.0);
        assert_eq!((app.composed.width(), app.composed.height()), (320, 192));
    }

    #[test]
    fn test_pause_stops_frames() {
        let mut app = app(BackdropMode::Morphing);
        app.toggle_pause();
        app.tick(1.0 / 60.0);
        assert!(app.composed.is_degenerate());
        assert!(app.scene.host().has_pending_frame());
    }

    #[test]
    fn test_backdrop_cycle_remounts() {
        let mut app = app(BackdropMode::Professional);
        app.cycle_backdrop();
        assert_eq!(app.scene.mode(), BackdropMode::Morphing);
        assert_eq!(app.active_set().name, "Morphing");
        app.cycle_backdrop();
        assert_eq!(app.scene.mode(), BackdropMode::Animated);
        assert_eq!(app.active_set().name, "Professional");
    }

    #[test]
    fn test_palette_set_cycle() {
        let mut app = app(BackdropMode::Professional);
        app.cycle_palette_set();
        assert_eq!(app.palette_set.as_deref(), Some("Morphing"));
        assert_eq!(app.scene.status().detail, "Twilight");
        assert_eq!(app.config().palette_set.as_deref(), Some("Morphing"));
    }

    #[test]
    fn test_unknown_palette_set_falls_back() {
        let config = AppConfig {
            palette_set: Some("missing".to_string()),
            seed: Some(1),
            ..Default::default()
        };
        let app = App::new(config, PaletteLibrary::builtin_only(), 20, 10).unwrap();
        assert_eq!(app.palette_set, None);
        assert_eq!(app.active_set().name, "Professional");
    }

    #[test]
    fn test_adjust_reaches_scene() {
        let mut app = app(BackdropMode::Professional);
        app.focus = Focus::Push;
        app.adjust_focused_up();
        assert_eq!(app.settings.push_factor, 5.5);
        match &app.scene {
            Scene::Particles(field) => assert_eq!(field.settings().push_factor, 5.5),
            _ => unreachable!(),
        }
        app.focus = Focus::Controls;
        app.adjust_focused_down();
        assert_eq!(app.settings.push_factor, 5.5);
    }

    #[test]
    fn test_resize_and_pointer() {
        let mut app = app(BackdropMode::Professional);
        app.resize(50, 20);
        assert_eq!(app.scene.host().surface_size(), (400, 320));
        assert!(app.scene.host().is_subscribed(HostEvent::PointerMove));
        app.pointer_move(2, 1);
        match &app.scene {
            Scene::Particles(field) => {
                let pointer = field.pointer().unwrap();
                assert_eq!((pointer.x, pointer.y), (20.0, 24.0));
            }
            _ => unreachable!(),
        }
        app.pointer_leave();
        match &app.scene {
            Scene::Particles(field) => assert!(field.pointer().is_none()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_same_seed_same_particles() {
        let a = app(BackdropMode::Professional);
        let b = app(BackdropMode::Professional);
        match (&a.scene, &b.scene) {
            (Scene::Particles(fa), Scene::Particles(fb)) => {
                let xa: Vec<f32> = fa.particles().iter().map(|p| p.x).collect();
                let xb: Vec<f32> = fb.particles().iter().map(|p| p.x).collect();
                assert_eq!(xa, xb);
            }
            _ => unreachable!(),
        }
    }
}
