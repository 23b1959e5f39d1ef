use crate::braille::BrailleCanvas;
use crate::config::{AppConfig, MAX_UNITS_PER_DOT, MIN_UNITS_PER_DOT};
use crate::manifest::AnchorLink;
use crate::navigate::{open_logged, Navigator};
use crate::settings::SimulationSettings;
use crate::simulation::{ClickOutcome, WaveSimulation};
use crate::surface::RenderSurface;
use log::{info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Buffer,
    Declutter,
    MaxParticles,
    MergeChance,
    Nudge,
    Scale,
    SpawnInterval,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Buffer,
            Focus::Buffer => Focus::Declutter,
            Focus::Declutter => Focus::MaxParticles,
            Focus::MaxParticles => Focus::MergeChance,
            Focus::MergeChance => Focus::Nudge,
            Focus::Nudge => Focus::Scale,
            Focus::Scale => Focus::SpawnInterval,
            Focus::SpawnInterval => Focus::Buffer,
        }
    }

    /// Shift+Tab cycles through parameters in reverse alphabetical order
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::SpawnInterval,
            Focus::Buffer => Focus::SpawnInterval,
            Focus::Declutter => Focus::Buffer,
            Focus::MaxParticles => Focus::Declutter,
            Focus::MergeChance => Focus::MaxParticles,
            Focus::Nudge => Focus::MergeChance,
            Focus::Scale => Focus::Nudge,
            Focus::SpawnInterval => Focus::Scale,
        }
    }

    /// Line index in the parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls | Focus::Buffer => 0,
            Focus::Declutter => 1,
            Focus::MaxParticles => 2,
            Focus::MergeChance => 3,
            Focus::Nudge => 4,
            Focus::Scale => 5,
            Focus::SpawnInterval => 6,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    pub simulation: WaveSimulation,
    pub canvas: BrailleCanvas,
    navigator: Box<dyn Navigator>,
    started: Instant,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    /// One-line feedback shown in the status box
    pub message: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl App {
    pub fn new(
        canvas_width: u16,
        canvas_height: u16,
        config: &AppConfig,
        navigator: Box<dyn Navigator>,
        seed: Option<u64>,
    ) -> Self {
        let canvas = BrailleCanvas::new(canvas_width, canvas_height, config.units_per_dot);
        let settings = config.settings.clone();
        let simulation = match seed {
            Some(seed) => WaveSimulation::with_seed(canvas.bounds(), settings, seed),
            None => WaveSimulation::new(canvas.bounds(), settings),
        };
        Self {
            simulation,
            canvas,
            navigator,
            started: Instant::now(),
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            message: None,
            config_path: None,
        }
    }

    /// Time since startup; the clock every animation is measured against
    pub fn now(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn seed_anchors(&mut self, links: &[AnchorLink], now: Duration) {
        self.simulation.seed_anchors(links, now);
    }

    /// Frame callback: tick if due, then repaint the canvas
    pub fn frame(&mut self, now: Duration) -> bool {
        let ticked = self.simulation.frame(now, self.canvas.bounds());
        self.simulation.paint(&mut self.canvas);
        ticked
    }

    /// Pointer click on a canvas cell (relative to the canvas origin)
    pub fn click_cell(&mut self, col: u16, row: u16, now: Duration) -> ClickOutcome {
        let point = self.canvas.cell_to_surface(col, row);
        let outcome = self.simulation.click(point, now);
        self.message = match &outcome {
            ClickOutcome::Navigate { url, .. } => {
                if open_logged(self.navigator.as_mut(), url) {
                    Some(format!("Opened {}", url))
                } else {
                    Some(format!("Could not open {}", url))
                }
            }
            ClickOutcome::Collapsed(_) => Some("Collapsed".to_string()),
            ClickOutcome::AlreadyCollapsing(_) => Some("Already collapsing".to_string()),
            ClickOutcome::Miss => None,
        };
        outcome
    }

    pub fn collapse_all(&mut self, now: Duration) {
        let count = self.simulation.request_collapse_all(now);
        self.message = Some(format!("Collapsing {}", count));
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Buffer => self.simulation.settings.adjust_separation_buffer(0.1),
            Focus::Declutter => self.simulation.settings.adjust_declutter_interval(1),
            Focus::MaxParticles => self.simulation.settings.adjust_max_particles(10),
            Focus::MergeChance => self.simulation.settings.adjust_merge_probability(0.01),
            Focus::Nudge => self.simulation.settings.adjust_declutter_nudge(0.1),
            Focus::Scale => self.adjust_units_per_dot(1.0),
            Focus::SpawnInterval => self.simulation.settings.adjust_spawn_interval(250),
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Buffer => self.simulation.settings.adjust_separation_buffer(-0.1),
            Focus::Declutter => self.simulation.settings.adjust_declutter_interval(-1),
            Focus::MaxParticles => self.simulation.settings.adjust_max_particles(-10),
            Focus::MergeChance => self.simulation.settings.adjust_merge_probability(-0.01),
            Focus::Nudge => self.simulation.settings.adjust_declutter_nudge(-0.1),
            Focus::Scale => self.adjust_units_per_dot(-1.0),
            Focus::SpawnInterval => self.simulation.settings.adjust_spawn_interval(-250),
        }
    }

    /// Zoom the logical surface. Particles keep their logical coordinates; the
    /// next tick clamps any that end up outside.
    pub fn adjust_units_per_dot(&mut self, delta: f64) {
        let units = (self.canvas.units_per_dot() + delta).clamp(MIN_UNITS_PER_DOT, MAX_UNITS_PER_DOT);
        let (cols, rows) = self.canvas.size();
        self.canvas = BrailleCanvas::new(cols, rows, units);
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self, now: Duration) {
        self.simulation.toggle_pause(now);
    }

    /// Reset simulation
    pub fn reset(&mut self, now: Duration) {
        self.simulation.reset(now);
        self.message = Some("Reset".to_string());
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Match the canvas to a new terminal size; the simulation picks up the new
    /// bounds on its next frame
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        self.canvas.resize(canvas_width, canvas_height);
    }

    /// Snapshot of everything a config file persists
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            settings: self.simulation.settings.clone(),
            units_per_dot: self.canvas.units_per_dot(),
            ..AppConfig::default()
        }
    }

    /// Write the current settings to the config file
    pub fn save_config(&mut self) {
        let Some(path) = self.config_path.clone().or_else(AppConfig::default_path) else {
            warn!("No config directory available; settings not saved");
            self.message = Some("No config directory".to_string());
            return;
        };
        match self.to_config().save_to_file(&path) {
            Ok(()) => {
                info!("Saved config to {}", path.display());
                self.message = Some("Settings saved".to_string());
            }
            Err(e) => {
                warn!("{}", e);
                self.message = Some("Save failed".to_string());
            }
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.simulation.settings
    }
}
