mod app;
mod braille;
mod color;
mod config;
mod error;
mod geometry;
mod interaction;
mod manifest;
mod navigate;
mod particle;
mod placement;
mod settings;
mod simulation;
mod surface;
mod ui;

use app::App;
use clap::Parser;
use config::{AppConfig, APP_DIR};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use error::SetupError;
use log::{error, info, warn};
use manifest::AnchorManifest;
use navigate::SystemNavigator;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "wavefunctions")]
#[command(about = "Drifting, colliding and merging wave functions in the terminal")]
struct Args {
    /// Population cap; at the cap every contact merges (10-500)
    #[arg(short = 'm', long = "max-particles")]
    max_particles: Option<usize>,

    /// Chance that two touching particles merge below the cap (0.0-1.0)
    #[arg(long = "merge-chance")]
    merge_chance: Option<f64>,

    /// Ticks between de-clustering sweeps (1-120)
    #[arg(long = "declutter-interval")]
    declutter_interval: Option<u64>,

    /// Milliseconds between new particles (250-10000)
    #[arg(long = "spawn-interval")]
    spawn_interval: Option<u64>,

    /// Logical units per Braille dot (1-16)
    #[arg(long = "units-per-dot")]
    units_per_dot: Option<f64>,

    /// YAML anchor manifest (`links: [{name, link, color}]`)
    #[arg(short = 'a', long)]
    anchors: Option<PathBuf>,

    /// Start without any anchors
    #[arg(long = "no-anchors", conflicts_with = "anchors")]
    no_anchors: bool,

    /// JSON config file (defaults to the user config directory)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Log file (the terminal is busy drawing); filter with RUST_LOG
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join("wave-functions.log"))
}

/// Route `log` output to a file. Without any usable path logging stays off.
fn init_logging(path: Option<PathBuf>) -> Result<(), SetupError> {
    let Some(path) = path.or_else(default_log_path) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SetupError::Logging(format!("{}: {}", parent.display(), e)))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| SetupError::Logging(format!("{}: {}", path.display(), e)))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| SetupError::Logging(e.to_string()))
}

/// Load the config file, falling back to defaults. A missing default file is normal;
/// a missing explicit file or a broken one is logged.
fn load_config(explicit: Option<&Path>) -> AppConfig {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match AppConfig::default_path() {
            Some(path) if path.exists() => path,
            _ => return AppConfig::default(),
        },
    };
    match AppConfig::load_from_file(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{} ({}); using defaults", e, path.display());
            AppConfig::default()
        }
    }
}

/// CLI flags win over the config file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    let settings = &mut config.settings;
    if let Some(v) = args.max_particles {
        settings.max_particles = v;
    }
    if let Some(v) = args.merge_chance {
        settings.merge_probability = v;
    }
    if let Some(v) = args.declutter_interval {
        settings.declutter_interval = v;
    }
    if let Some(v) = args.spawn_interval {
        settings.spawn_interval_ms = v;
    }
    if let Some(v) = args.units_per_dot {
        config.units_per_dot = v;
    }
    config.sanitize();
}

fn load_anchors(args: &Args) -> AnchorManifest {
    if args.no_anchors {
        return AnchorManifest::default();
    }
    AnchorManifest::load_or_builtin(args.anchors.as_deref())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_logging(args.log_file.clone())?;

    let mut config = load_config(args.config.as_deref());
    apply_overrides(&mut config, &args);
    let manifest = load_anchors(&args);
    info!(
        "Starting: cap {}, {} anchors",
        config.settings.max_particles,
        manifest.links.len()
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start(&mut terminal, &config, &manifest, &args);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("{}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    info!("Shutting down");
    Ok(())
}

fn terminal_area<B: ratatui::backend::Backend>(terminal: &Terminal<B>) -> io::Result<Rect> {
    let size = terminal.size()?;
    Ok(Rect {
        x: 0,
        y: 0,
        width: size.width,
        height: size.height,
    })
}

/// Check the surface, build the app and hand over to the event loop
fn start<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    config: &AppConfig,
    manifest: &AnchorManifest,
    args: &Args,
) -> Result<(), SetupError> {
    let area = terminal_area(terminal)?;
    let (canvas_width, canvas_height) = ui::get_canvas_size(area, false);
    if canvas_width == 0 || canvas_height == 0 {
        return Err(SetupError::SurfaceUnavailable {
            width: canvas_width,
            height: canvas_height,
        });
    }

    let mut app = App::new(
        canvas_width,
        canvas_height,
        config,
        Box::new(SystemNavigator),
        args.seed,
    );
    app.config_path = args.config.clone();
    let now = app.now();
    app.seed_anchors(&manifest.links, now);

    run_app(terminal, &mut app)?;
    Ok(())
}

/// Resize the canvas to whatever the current layout leaves for it
fn sync_canvas<B: ratatui::backend::Backend>(terminal: &Terminal<B>, app: &mut App) -> io::Result<()> {
    let area = terminal_area(terminal)?;
    let (canvas_width, canvas_height) = ui::get_canvas_size(area, app.fullscreen_mode);
    app.resize(canvas_width, canvas_height);
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with timeout
        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => {
                            let now = app.now();
                            app.toggle_pause(now);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            let now = app.now();
                            app.reset(now);
                        }
                        KeyCode::Char('x') | KeyCode::Char('X') => {
                            let now = app.now();
                            app.collapse_all(now);
                        }
                        KeyCode::Char('s') | KeyCode::Char('S') => app.save_config(),
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            sync_canvas(terminal, app)?;
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if app.show_help {
                                app.scroll_help_up();
                            } else {
                                app.adjust_focused_up();
                            }
                        }
                        KeyCode::Down => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            } else {
                                app.adjust_focused_down();
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = app::Focus::Controls;
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
                    if mouse.kind == MouseEventKind::Down(MouseButton::Left) && !app.show_help {
                        let area = terminal_area(terminal)?;
                        if let Some((col, row)) =
                            ui::canvas_cell(area, app.fullscreen_mode, mouse.column, mouse.row)
                        {
                            let now = app.now();
                            app.click_cell(col, row, now);
                        }
                    }
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) = ui::get_canvas_size(
                        Rect {
                            x: 0,
                            y: 0,
                            width,
                            height,
                        },
                        app.fullscreen_mode,
                    );
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        // Run simulation tick
        let now = app.now();
        app.frame(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_overrides_are_sanitized() {
        let args = Args::try_parse_from([
            "wavefunctions",
            "--max-particles",
            "5000",
            "--merge-chance",
            "0.25",
            "--units-per-dot",
            "2",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.settings.max_particles, 500);
        assert_eq!(config.settings.merge_probability, 0.25);
        assert_eq!(config.units_per_dot, 2.0);
        assert_eq!(config.settings.spawn_interval_ms, 2000);
    }

    #[test]
    fn test_no_anchors_conflicts_with_manifest() {
        let result = Args::try_parse_from(["wavefunctions", "--no-anchors", "--anchors", "a.yaml"]);
        assert!(result.is_err());

        let args = Args::try_parse_from(["wavefunctions", "--no-anchors"]).unwrap();
        assert!(load_anchors(&args).links.is_empty());

        let args = Args::try_parse_from(["wavefunctions"]).unwrap();
        assert_eq!(load_anchors(&args), AnchorManifest::builtin());
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let missing = load_config(Some(Path::new("/nonexistent/wave/config.json")));
        assert_eq!(missing, AppConfig::default());

        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "{ broken").unwrap();
        assert_eq!(load_config(Some(temp_file.path())), AppConfig::default());

        let mut saved = AppConfig::default();
        saved.settings.max_particles = 60;
        saved.save_to_file(temp_file.path()).unwrap();
        assert_eq!(load_config(Some(temp_file.path())).settings.max_particles, 60);
    }
}
