mod app;
mod blocks;
mod color;
mod config;
mod easing;
mod export;
mod field;
mod headless;
mod host;
mod palette;
mod particle;
mod presets;
mod scene;
mod settings;
mod shapes;
mod surface;
mod timeline;
mod ui;

use app::{App, Focus};
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use headless::HeadlessRun;
use presets::{PaletteLibrary, PaletteSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use scene::Scene;
use settings::BackdropMode;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "particle-field")]
#[command(about = "Ambient particle field and gradient backgrounds in the terminal")]
struct Args {
    // === Scene ===
    /// Backdrop (particles, morphing, animated, interactive)
    #[arg(short = 'b', long)]
    backdrop: Option<String>,

    /// Palette set name (built-in: Professional, Morphing; or a user set)
    #[arg(long = "palette-set")]
    palette_set: Option<String>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    // === Field Parameters ===
    /// Maximum particle count (10-200)
    #[arg(long = "max-particles")]
    max_particles: Option<usize>,

    /// Velocity kept on an edge bounce (0.1-1.0)
    #[arg(long)]
    bounce: Option<f32>,

    /// Pointer influence radius in pixels (0-500)
    #[arg(long = "pointer-radius")]
    pointer_radius: Option<f32>,

    /// Pointer push strength (0-20)
    #[arg(long)]
    push: Option<f32>,

    /// Connection line distance in pixels (0-300)
    #[arg(long)]
    connections: Option<f32>,

    /// Fraction of pixels touched by grain noise (0.0-0.1)
    #[arg(long)]
    noise: Option<f32>,

    /// Seconds per palette (1-60)
    #[arg(long = "palette-step")]
    palette_step: Option<f32>,

    // === Config ===
    /// Load configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to a JSON file and exit
    #[arg(long = "save-config")]
    save_config: Option<PathBuf>,

    /// Copy a palette set JSON file into the user palette directory and exit
    #[arg(long = "import-palettes")]
    import_palettes: Option<PathBuf>,

    // === Headless ===
    /// Render offscreen instead of opening the terminal UI
    #[arg(long)]
    headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value = "300")]
    frames: usize,

    /// Headless surface width in pixels
    #[arg(long, default_value = "960")]
    width: u32,

    /// Headless surface height in pixels
    #[arg(long, default_value = "540")]
    height: u32,

    /// Move a scripted pointer across the surface in headless mode
    #[arg(long)]
    sweep: bool,

    /// Headless GIF output
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Headless PNG output (last frame)
    #[arg(long)]
    png: Option<PathBuf>,
}

fn parse_backdrop(s: &str) -> BackdropMode {
    match s.to_lowercase().as_str() {
        "morphing" | "morph" | "gradient" => BackdropMode::Morphing,
        "animated" | "shapes" => BackdropMode::Animated,
        "interactive" | "parallax" => BackdropMode::Interactive,
        _ => BackdropMode::Professional,
    }
}

/// Layer CLI flags over the loaded (or default) configuration
fn build_config(args: &Args) -> Result<AppConfig, String> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(backdrop) = &args.backdrop {
        config.backdrop = parse_backdrop(backdrop);
    }
    if let Some(name) = &args.palette_set {
        config.palette_set = Some(name.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let settings = &mut config.settings;
    if let Some(v) = args.max_particles {
        settings.max_particles = v;
    }
    if let Some(v) = args.bounce {
        settings.bounce_damping = v;
    }
    if let Some(v) = args.pointer_radius {
        settings.pointer_radius = v;
    }
    if let Some(v) = args.push {
        settings.push_factor = v;
    }
    if let Some(v) = args.connections {
        settings.connection_threshold = v;
    }
    if let Some(v) = args.noise {
        settings.noise_probability = v;
    }
    if let Some(v) = args.palette_step {
        settings.palette_step_secs = v;
    }
    config.settings = config.settings.clamped();
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = build_config(&args)?;

    if let Some(path) = &args.save_config {
        config.save_to_file(path)?;
        println!("Saved configuration to {}", path.display());
        return Ok(());
    }

    let mut library = PaletteLibrary::new();
    if let Some(path) = &args.import_palettes {
        let set = PaletteSet::load_from_file(path)?;
        let name = set.name.clone();
        let saved = library.save_set(set)?;
        println!("Imported palette set '{}' to {}", name, saved.display());
        return Ok(());
    }
    if let Some(name) = &config.palette_set {
        if library.find(name).is_none() {
            eprintln!(
                "Unknown palette set '{}' (available: {}), using the backdrop default",
                name,
                library.set_names().join(", ")
            );
        }
    }

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        return run_headless(&args, &config, &library);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let (canvas_width, canvas_height) =
        ui::get_canvas_size(Rect::new(0, 0, size.width, size.height), false);

    let res = App::new(config, library, canvas_width, canvas_height)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .and_then(|mut app| {
            let res = run_app(&mut terminal, &mut app);
            app.finish_recording();
            res
        });

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_headless(
    args: &Args,
    config: &AppConfig,
    library: &PaletteLibrary,
) -> Result<(), Box<dyn std::error::Error>> {
    let set = config
        .palette_set
        .as_deref()
        .and_then(|name| library.find(name))
        .unwrap_or_else(|| library.default_for(config.backdrop));
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut scene = Scene::mount(
        config.backdrop,
        args.width,
        args.height,
        &config.settings,
        set.palettes.clone(),
        rng,
    )?;

    let run = HeadlessRun {
        frames: args.frames,
        pointer_sweep: args.sweep,
        gif: args.gif.clone(),
        png: args.png.clone(),
    };
    let report = run.run(&mut scene)?;
    scene.teardown();

    println!(
        "Rendered {} frames at {}x{}{}",
        report.frames_rendered,
        report.width,
        report.height,
        if report.gif_frames > 0 {
            format!(", {} GIF frames", report.gif_frames)
        } else {
            String::new()
        }
    );
    Ok(())
}

/// Canvas size for the current terminal and layout
fn canvas_size<B: ratatui::backend::Backend>(terminal: &Terminal<B>, fullscreen: bool) -> (u16, u16) {
    let size = terminal.size().unwrap_or_default();
    ui::get_canvas_size(Rect::new(0, 0, size.width, size.height), fullscreen)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.remount(),
                        KeyCode::Char('b') | KeyCode::Char('B') => app.cycle_backdrop(),
                        KeyCode::Char('c') | KeyCode::Char('C') => app.cycle_palette_set(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.snapshot(),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.save_config(),
                        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_recording(),
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            let (w, h) = canvas_size(terminal, app.fullscreen_mode);
                            app.resize(w, h);
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up | KeyCode::Right => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_up();
                                } else {
                                    app.scroll_controls_up();
                                }
                            }
                        }
                        KeyCode::Down | KeyCode::Left => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_down();
                                } else {
                                    let term_size = terminal.size().unwrap_or_default();
                                    let visible = ui::get_controls_visible_lines(term_size.height);
                                    app.scroll_controls_down(
                                        ui::CONTROLS_CONTENT_LINES.saturating_sub(visible),
                                    );
                                }
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                        let (ox, oy) = ui::get_canvas_origin(app.fullscreen_mode);
                        let (cw, ch) = app.canvas;
                        let inside = mouse.column >= ox
                            && mouse.row >= oy
                            && mouse.column < ox + cw
                            && mouse.row < oy + ch;
                        if inside {
                            app.pointer_move(mouse.column - ox, mouse.row - oy);
                        } else {
                            app.pointer_leave();
                        }
                    }
                }
                Event::FocusLost => app.pointer_leave(),
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) =
                        ui::get_canvas_size(Rect::new(0, 0, width, height), app.fullscreen_mode);
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        app.tick(dt);
    }
}
