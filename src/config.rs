use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Names a JSON settings file.
pub const CONFIG_ENV: &str = "ANNEXURE_CONFIG";
/// Overrides where annexures are written.
pub const OUTPUT_DIR_ENV: &str = "ANNEXURE_OUTPUT_DIR";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Application settings. Later sources win: defaults, then the JSON file
/// named by `ANNEXURE_CONFIG`, then `ANNEXURE_OUTPUT_DIR`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory annexures are written into.
    pub output_dir: PathBuf,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            window_width: 1400.0,
            window_height: 900.0,
        }
    }
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        let file = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let output_dir = std::env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from);
        Self::resolve(file.as_deref(), output_dir)
    }

    fn resolve(file: Option<&Path>, output_dir: Option<PathBuf>) -> Result<Self> {
        let mut settings = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(dir) = output_dir {
            settings.output_dir = dir;
        }
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
    }
}
