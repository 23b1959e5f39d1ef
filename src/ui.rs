use crate::app::{App, Focus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

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

/// Inner canvas rectangle (excluding borders) for a given terminal area
pub fn canvas_rect(frame_area: Rect, fullscreen: bool) -> Rect {
    let left = if fullscreen { 0 } else { SIDEBAR_WIDTH };
    Rect {
        x: frame_area.x + left + 1,
        y: frame_area.y + 1,
        width: frame_area.width.saturating_sub(left + 2),
        height: frame_area.height.saturating_sub(2),
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    let rect = canvas_rect(frame_area, fullscreen);
    (rect.width, rect.height)
}

/// Map a terminal position to a canvas cell, `None` outside the canvas
pub fn canvas_cell(frame_area: Rect, fullscreen: bool, column: u16, row: u16) -> Option<(u16, u16)> {
    let rect = canvas_rect(frame_area, fullscreen);
    let inside = column >= rect.x
        && row >= rect.y
        && column < rect.x + rect.width
        && row < rect.y + rect.height;
    inside.then(|| (column - rect.x, row - rect.y))
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12), // Status
            Constraint::Length(9), // Parameters
            Constraint::Min(6),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2]);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Wave Functions ");
    let sim = &app.simulation;
    let stats = &sim.stats;

    let (status_text, status_color) = if sim.is_paused() {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else {
        ("RUNNING", BORDER_COLOR)
    };

    let stat = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<11}", label), Style::default().fg(DIM_TEXT_COLOR)),
            Span::styled(value, Style::default().fg(TEXT_COLOR)),
        ])
    };
    let content = vec![
        stat(
            "Particles",
            format!("{} / {}", sim.population(), sim.settings.max_particles),
        ),
        stat("Anchors", sim.anchor_count().to_string()),
        stat("Spawned", format!("{} ({} gone)", stats.spawned, stats.removed)),
        stat("Merges", stats.merges.to_string()),
        stat("Collapses", stats.collapses.to_string()),
        stat("Collisions", stats.collisions.to_string()),
        stat("Declutter", stats.declutter_separations.to_string()),
        stat("Ticks", stats.ticks.to_string()),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
        Line::from(Span::styled(
            app.message.clone().unwrap_or_default(),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

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

    let settings = app.settings();

    let content = vec![
        make_line(
            "Buffer",
            format!("{:.1}", settings.separation_buffer),
            app.focus == Focus::Buffer,
        ),
        make_line(
            "Declutter",
            format!("{} ticks", settings.declutter_interval),
            app.focus == Focus::Declutter,
        ),
        make_line(
            "Max",
            format!("{}", settings.max_particles),
            app.focus == Focus::MaxParticles,
        ),
        make_line(
            "Merge",
            format!("{:.0}%", settings.merge_probability * 100.0),
            app.focus == Focus::MergeChance,
        ),
        make_line(
            "Nudge",
            format!("{:.1}", settings.declutter_nudge),
            app.focus == Focus::Nudge,
        ),
        make_line(
            "Scale",
            format!("{:.0}/dot", app.canvas.units_per_dot()),
            app.focus == Focus::Scale,
        ),
        make_line(
            "Spawn",
            format!("{:.2}s", settings.spawn_interval_ms as f64 / 1000.0),
            app.focus == Focus::SpawnInterval,
        ),
    ];

    // Keep the focused line visible
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let scroll = if visible_height == 0 || focus_line < visible_height {
        0
    } else {
        focus_line.saturating_sub(visible_height - 1)
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Click", "collapse / open"),
        make_control("Space", "pause/resume"),
        make_control("X", "collapse all"),
        make_control("R", "reset"),
        make_control("Tab", "select param"),
        make_control("↑/↓", "adjust param"),
        make_control("S", "save settings"),
        make_control("V", "fullscreen"),
        make_control("H/?", "help"),
        make_control("Q", "quit"),
    ];

    let paragraph = Paragraph::new(content).block(styled_block(" Controls "));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let buffer = frame.buffer_mut();
    for cell in app.canvas.to_cells() {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;
        if x < inner.x + inner.width && y < inner.y + inner.height {
            buffer.set_string(x, y, cell.char.to_string(), Style::default().fg(cell.color));
        }
    }

    // Labels go on top of the dots
    for row in app.canvas.text_rows() {
        let x = inner.x + row.x;
        let y = inner.y + row.y;
        if y < inner.y + inner.height && x < inner.x + inner.width {
            let room = (inner.x + inner.width - x) as usize;
            buffer.set_stringn(
                x,
                y,
                &row.text,
                room,
                Style::default().fg(row.color).add_modifier(Modifier::BOLD),
            );
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = area.width.saturating_sub(canvas_x);

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    // Clear the background
    frame.render_widget(Clear, help_area);

    let heading = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(HIGHLIGHT_COLOR)));
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("WAVE FUNCTIONS", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Circular bodies drift across the canvas, bounce off the walls and collide elastically. Touching particles sometimes merge into one larger particle with the same total area."),
        Line::from(""),
        heading("COLLAPSE:"),
        Line::from("Click a particle to collapse it: it fades out and disappears. X collapses every particle at once. New particles keep appearing until the cap is reached."),
        Line::from(""),
        heading("ANCHORS:"),
        Line::from("Labeled particles are anchors. They never merge or collapse; clicking one opens its link."),
        Line::from(""),
        heading("PARAMETERS:"),
        Line::from("Max: population cap. At the cap every contact merges."),
        Line::from("Merge: chance a contact merges below the cap."),
        Line::from("Spawn: time between new particles."),
        Line::from("Declutter: ticks between overlap sweeps; Nudge: random kick per sweep."),
        Line::from("Buffer: extra separation after a collision."),
        Line::from("Scale: logical units per Braille dot."),
        Line::from(""),
        heading("BASIC CONTROLS:"),
        Line::from("Space=Pause, R=Reset, X=Collapse all, S=Save settings, V=Fullscreen, Tab/Arrows=Adjust, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let is_scrollable = content_height > visible_height;

    let title = if is_scrollable {
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
    use crate::manifest::AnchorLink;
    use crate::navigate::testing::RecordingNavigator;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn area(width: u16, height: u16) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn test_canvas_size_excludes_sidebar() {
        assert_eq!(get_canvas_size(area(100, 30), false), (100 - SIDEBAR_WIDTH - 2, 28));
        assert_eq!(get_canvas_size(area(100, 30), true), (98, 28));
        assert_eq!(get_canvas_size(area(10, 1), false), (0, 0));
    }

    #[test]
    fn test_canvas_cell_mapping() {
        let full = area(100, 30);
        assert_eq!(canvas_cell(full, true, 1, 1), Some((0, 0)));
        assert_eq!(canvas_cell(full, true, 0, 5), None);
        assert_eq!(canvas_cell(full, false, SIDEBAR_WIDTH + 1, 3), Some((0, 2)));
        assert_eq!(canvas_cell(full, false, 5, 5), None);
        assert_eq!(canvas_cell(full, false, 99, 5), None);
    }

    #[test]
    fn test_render_draws_sidebar_and_labels() {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        let (w, h) = get_canvas_size(area(120, 40), false);
        let mut app = App::new(
            w,
            h,
            &AppConfig::default(),
            Box::new(RecordingNavigator::default()),
            Some(3),
        );
        app.seed_anchors(&[AnchorLink::new("Docs", "https://docs.rs", "#3fb950")], Duration::ZERO);
        app.frame(Duration::from_secs(1));

        let screen = |terminal: &Terminal<TestBackend>| -> String {
            terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect()
        };

        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Wave Functions"));
        assert!(text.contains("Docs"));

        app.show_help = true;
        terminal.draw(|frame| render(frame, &app)).unwrap();
        assert!(screen(&terminal).contains("WAVE FUNCTIONS"));
    }
}
