//! User settings, persisted as JSON in the platform config directory.
//!
//! - Linux: `~/.config/graphsmith/settings.json`
//! - macOS: `~/Library/Application Support/graphsmith/settings.json`
//! - Windows: `%APPDATA%\graphsmith\settings.json`

use crate::constants::{AUTO_SERIES_LIMIT, MAX_CSV_ROWS, MAX_HISTORY_STATES, SLOW_OPERATION_MS};
use crate::data::{self, DataResult, TabularDataset};
use crate::transform::{SmoothMethod, TransformKind};
use crate::types::ThemeMode;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const APP_DIR: &str = "graphsmith";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Undo states kept by the app state
    pub history_limit: usize,
    /// Series created automatically when a dataset is imported
    pub auto_series_limit: usize,
    /// Default `partial_window` for new Smooth transforms
    pub partial_windows: bool,
    pub default_theme: ThemeMode,
    /// Row cap for CSV imports
    pub max_import_rows: usize,
    /// Pipeline runs and renders slower than this are logged
    pub slow_operation_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: MAX_HISTORY_STATES,
            auto_series_limit: AUTO_SERIES_LIMIT,
            partial_windows: false,
            default_theme: ThemeMode::Light,
            max_import_rows: MAX_CSV_ROWS,
            slow_operation_ms: SLOW_OPERATION_MS,
        }
    }
}

impl Settings {
    /// Location of the settings file, if the platform has a config directory
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            warn!("Could not determine settings path, using defaults");
            return Self::default();
        };
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.history_limit >= 1, "history_limit must be at least 1");
        ensure!(self.max_import_rows >= 1, "max_import_rows must be at least 1");
        ensure!(
            self.slow_operation_ms.is_finite() && self.slow_operation_ms >= 0.0,
            "slow_operation_ms must be a non-negative number"
        );
        Ok(())
    }

    /// A Smooth transform using the configured partial-window default
    pub fn smooth(&self, method: SmoothMethod, column: impl Into<String>, window: usize) -> TransformKind {
        TransformKind::Smooth {
            method,
            column: column.into(),
            window,
            alpha: None,
            partial_window: self.partial_windows,
        }
    }

    /// Load a data file with the configured row cap
    pub fn import_file(&self, path: &Path) -> DataResult<TabularDataset> {
        data::load_data_file(path, self.max_import_rows)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path().context("Could not determine settings path")?;
        self.save_to(&path)
    }

    /// Write settings to `path`, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}
