//! Anchor manifest: the fixed list of labeled link particles seeded at startup.
//!
//! Stored as YAML in the same shape the web version used:
//!
//! ```yaml
//! links:
//!   - name: "Source\nCode"
//!     link: https://github.com
//!     color: "#6e5494"
//! ```

use crate::color::parse_color;
use log::{info, warn};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read anchor manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse anchor manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Anchor {name:?} has an empty link")]
    EmptyLink { name: String },
}

/// One anchor entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorLink {
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub color: String,
}

impl AnchorLink {
    pub fn new(name: impl Into<String>, link: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            color: color.into(),
        }
    }

    /// Parsed fill color, `None` when missing or unparseable
    pub fn parsed_color(&self) -> Option<Color> {
        parse_color(&self.color)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnchorManifest {
    #[serde(default)]
    pub links: Vec<AnchorLink>,
}

impl AnchorManifest {
    /// Anchors used when no manifest file is given
    pub fn builtin() -> Self {
        Self {
            links: vec![
                AnchorLink::new("Source\nCode", "https://github.com", "#6e5494"),
                AnchorLink::new("Rust", "https://www.rust-lang.org", "#dea584"),
                AnchorLink::new("Docs", "https://docs.rs", "#3fb950"),
                AnchorLink::new("Crates", "https://crates.io", "#ffc832"),
            ],
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ManifestError> {
        let manifest: AnchorManifest = serde_yaml::from_str(yaml)?;
        if let Some(bad) = manifest.links.iter().find(|l| l.link.trim().is_empty()) {
            return Err(ManifestError::EmptyLink {
                name: bad.name.clone(),
            });
        }
        Ok(manifest)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Built-in anchors when `path` is `None`. A file that cannot be loaded is logged and
    /// yields no anchors; the simulation still runs.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };
        match Self::load_from_file(path) {
            Ok(manifest) => {
                info!("Loaded {} anchors from {}", manifest.links.len(), path.display());
                for link in manifest.links.iter().filter(|l| l.parsed_color().is_none()) {
                    warn!("Anchor {:?} has unrecognized color {:?}", link.name, link.color);
                }
                manifest
            }
            Err(e) => {
                warn!("Error loading anchor manifest {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
