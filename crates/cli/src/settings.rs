use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use clipmatch_core::shared::constants::{APP_DIR_NAME, DEFAULT_LANGUAGE, DEFAULT_WINDOW_SIZE};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Defaults for matching and transcription; command-line flags win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_size: usize,
    pub min_score: f64,
    pub model: String,
    pub language: String,
    pub autojunk: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_score: 0.0,
            model: "base".to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            autojunk: false,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads `explicit` if given, otherwise the per-user settings file.
    ///
    /// A missing or unreadable per-user file falls back to defaults; an
    /// explicit file must load.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let Some(path) = Self::config_path().filter(|p| p.exists()) else {
            return Ok(Self::default());
        };
        match Self::load_from(&path) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                log::warn!("Ignoring settings: {e}");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
