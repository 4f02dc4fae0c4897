// src/config.rs
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Application configuration loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Service account key file used to authenticate.
    pub file_path: PathBuf,
    /// Id of the spreadsheet document.
    pub sheet_id: String,
    pub logs_directory: PathBuf,
    /// Columns to retrieve from every worksheet, 1-based as the
    /// spreadsheet service numbers them.
    pub columns: Vec<u32>,
    pub plot_settings: PlotSettings,
    pub logging_level: String,
}

/// Chart styling options.
#[derive(Debug, Clone, Deserialize)]
pub struct PlotSettings {
    pub xlabel: String,
    pub ylabel: String,
    pub title: String,
    /// Legend anchor, e.g. "upper right" or "lower left".
    pub legend_loc: String,
    pub legend_fontsize: u32,
    pub legend_title: String,
    pub legend_title_fontsize: u32,
    pub legend_shadow: bool,
    pub legend_frameon: bool,
    #[serde(default)]
    pub grid: bool,
    #[serde(default = "default_line_style")]
    pub line_style: String,
    #[serde(default = "default_line_color")]
    pub line_color: String,
    #[serde(default = "default_line_width")]
    pub line_width: u32,
    /// Marker shape, empty for none. Scatter charts fall back to "o".
    #[serde(default)]
    pub marker: String,
}

fn default_line_style() -> String {
    "-".to_string()
}

fn default_line_color() -> String {
    "blue".to_string()
}

fn default_line_width() -> u32 {
    1
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let file = File::open(path).map_err(|err| {
        Error::Configuration(format!(
            "cannot open config file '{}': {err}",
            path.display()
        ))
    })?;
    let config: AppConfig = serde_json::from_reader(file).map_err(|err| {
        Error::Configuration(format!(
            "invalid config file '{}': {err}",
            path.display()
        ))
    })?;
    if config.sheet_id.trim().is_empty() {
        return Err(Error::Configuration("sheet_id must not be empty".into()));
    }
    if config.columns.is_empty() {
        return Err(Error::Configuration(
            "columns must name at least one column".into(),
        ));
    }
    if config.columns.contains(&0) {
        return Err(Error::Configuration(
            "columns are 1-based; 0 is not a valid column index".into(),
        ));
    }
    Ok(config)
}

/// Paths remembered between runs. An absent or unreadable file simply
/// yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub last_config_path: Option<PathBuf>,
    #[serde(default)]
    pub last_save_directory: Option<PathBuf>,
}

impl Settings {
    pub fn load(path: &Path) -> Self {
        match File::open(path) {
            Ok(file) => serde_json::from_reader(file).unwrap_or_default(),
            Err(_) => Settings::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|err| {
            Error::Configuration(format!(
                "cannot write settings file '{}': {err}",
                path.display()
            ))
        })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|err| Error::Configuration(err.to_string()))
    }
}
