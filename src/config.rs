use crate::settings::SimulationSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const APP_DIR: &str = "wave-functions";
pub const CONFIG_VERSION: u32 = 1;

pub const MIN_UNITS_PER_DOT: f64 = 1.0;
pub const MAX_UNITS_PER_DOT: f64 = 16.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Unsupported config version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Persisted configuration: every tunable plus the terminal scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    #[serde(default)]
    pub settings: SimulationSettings,
    /// Logical units covered by one Braille dot
    #[serde(default = "default_units_per_dot")]
    pub units_per_dot: f64,
}

fn default_units_per_dot() -> f64 {
    4.0
}

impl AppConfig {
    /// `<config_dir>/wave-functions/config.json`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::Write)?;
        }
        fs::write(path, json).map_err(ConfigError::Write)
    }

    /// Load and sanitize; out-of-range values are clamped rather than rejected
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::Read)?;
        let mut config: AppConfig = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::Version {
                found: config.version,
                expected: CONFIG_VERSION,
            });
        }
        config.sanitize();
        Ok(config)
    }

    pub fn sanitize(&mut self) {
        self.settings.sanitize();
        self.units_per_dot = if self.units_per_dot.is_finite() {
            self.units_per_dot.clamp(MIN_UNITS_PER_DOT, MAX_UNITS_PER_DOT)
        } else {
            default_units_per_dot()
        };
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: SimulationSettings::default(),
            units_per_dot: default_units_per_dot(),
        }
    }
}
