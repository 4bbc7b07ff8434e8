use crate::app::{App, Focus};
use crate::blocks;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 13;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

const STATUS_HEIGHT: u16 = 7;
const PARAMS_HEIGHT: u16 = 8;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (frame_area.width.saturating_sub(2), frame_area.height.saturating_sub(2))
    } else {
        let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
        let canvas_height = frame_area.height.saturating_sub(2);
        (canvas_width, canvas_height)
    }
}

/// Terminal position of the canvas' top-left cell
pub fn get_canvas_origin(fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (1, 1)
    } else {
        (SIDEBAR_WIDTH + 1, 1)
    }
}

/// Visible lines of the controls box for a terminal height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    terminal_height
        .saturating_sub(STATUS_HEIGHT + PARAMS_HEIGHT)
        .saturating_sub(2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(PARAMS_HEIGHT),
            Constraint::Min(6),
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Particle Field ");
    let status = app.scene.status();

    let (state_text, state_color) = if let Some(recorder) = &app.recorder {
        (format!("RECORDING {}", recorder.frames()), Color::Red)
    } else if !app.scene.is_active() {
        ("STOPPED".to_string(), DIM_TEXT_COLOR)
    } else if app.paused {
        ("PAUSED".to_string(), HIGHLIGHT_COLOR)
    } else {
        ("RUNNING".to_string(), BORDER_COLOR)
    };

    let mut content = vec![
        Line::from(Span::styled(
            format!("{} / {}", status.mode.name(), app.active_set().name),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(status.detail, Style::default().fg(TEXT_COLOR))),
        Line::from(Span::styled(
            format!("{} particles", status.particles),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(state_text, Style::default().fg(state_color))),
    ];
    if let Some(message) = &app.message {
        content.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(DIM_TEXT_COLOR),
        )));
    }

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = &app.settings;

    let content = vec![
        make_line(
            "Bounce",
            format!("{:.2}", settings.bounce_damping),
            app.focus == Focus::Bounce,
        ),
        make_line(
            "Links",
            format!("{:.0}px", settings.connection_threshold),
            app.focus == Focus::Connections,
        ),
        make_line(
            "Noise",
            format!("{:.3}", settings.noise_probability),
            app.focus == Focus::Noise,
        ),
        make_line(
            "Palette",
            format!("{:.0}s", settings.palette_step_secs),
            app.focus == Focus::PaletteStep,
        ),
        make_line(
            "Push",
            format!("{:.1}", settings.push_factor),
            app.focus == Focus::Push,
        ),
        make_line(
            "Radius",
            format!("{:.0}px", settings.pointer_radius),
            app.focus == Focus::Radius,
        ),
    ];

    // Keep the focused line visible
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2);
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume".to_string()),
        make_control("H", "help".to_string()),
        make_control("R", "remount".to_string()),
        make_control("B", format!("backdrop: {}", app.backdrop.name())),
        make_control("C", "palette set".to_string()),
        make_control("V", "fullscreen".to_string()),
        make_control("P", "save PNG".to_string()),
        make_control("G", "record GIF".to_string()),
        make_control("S", "save config".to_string()),
        make_control("Tab", "select param".to_string()),
        make_control("↑/↓", "adjust".to_string()),
        make_control("Mouse", "push particles".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2);
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let paragraph = Paragraph::new(content)
        .block(styled_block(title))
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = blocks::render_to_blocks(app.composed.image(), inner.width, inner.height);
    let buffer = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;
        if x < inner.x + inner.width && y < inner.y + inner.height {
            if let Some(target) = buffer.cell_mut((x, y)) {
                target
                    .set_char(blocks::UPPER_HALF)
                    .set_fg(cell.top)
                    .set_bg(cell.bottom);
            }
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Center within the canvas, excluding the sidebar unless fullscreen
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(32);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = Style::default().fg(HIGHLIGHT_COLOR);
    let topic = Style::default().fg(TEXT_COLOR);
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("PARTICLE FIELD", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Glowing particles drift on a slowly cycling gradient, linked by faint lines when close, and shy away from the mouse."),
        Line::from(""),
        Line::from(Span::styled("BACKDROPS (B):", heading)),
        Line::from(Span::styled("Particles", topic)),
        Line::from("Palette-cycled gradient with the particle field"),
        Line::from(Span::styled("Morphing", topic)),
        Line::from("Gradient-only cycle, 5 s per step"),
        Line::from(Span::styled("Animated", topic)),
        Line::from("Soft shapes drifting, turning and breathing"),
        Line::from(Span::styled("Interactive", topic)),
        Line::from("Soft circles that lean towards the mouse"),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS (Tab, arrows):", heading)),
        Line::from("Bounce = speed kept on edge bounce, Links = connection distance, Noise = grain density, Palette = seconds per palette, Push = pointer strength, Radius = pointer reach"),
        Line::from(""),
        Line::from(Span::styled("EXPORT:", heading)),
        Line::from("P = PNG snapshot, G = start/stop GIF recording (written to the working directory)"),
        Line::from("S = save the current settings as a config file for --config"),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", heading)),
        Line::from("Space=Pause, R=Remount, C=Palette set, V=Fullscreen, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::presets::PaletteLibrary;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_canvas_geometry() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(get_canvas_size(area, false), (100 - SIDEBAR_WIDTH - 2, 38));
        assert_eq!(get_canvas_size(area, true), (98, 38));
        assert_eq!(get_canvas_origin(true), (1, 1));
        assert_eq!(get_canvas_origin(false), (SIDEBAR_WIDTH + 1, 1));
    }

    #[test]
    fn test_render_draws_half_blocks() {
        let area = Rect::new(0, 0, 80, 24);
        let (cw, ch) = get_canvas_size(area, false);
        let config = AppConfig {
            seed: Some(3),
            ..Default::default()
        };
        let mut app = App::new(config, PaletteLibrary::builtin_only(), cw, ch).unwrap();
        app.tick(1.0 / 60.0);
        app.show_help = true;

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let (ox, oy) = get_canvas_origin(false);
        assert_eq!(buffer[(ox, oy)].symbol(), "▀");
    }
}
