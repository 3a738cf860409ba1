// User settings
// Loaded from ~/.config/faed/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for report exports. `None` = platform data dir.
    #[serde(rename = "export.directory", skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,

    /// Directory for input backups. `None` = platform data dir.
    #[serde(rename = "backup.directory", skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    /// Copy the input file before processing
    #[serde(rename = "backup.enabled")]
    pub backup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            export_dir: None,
            backup_dir: None,
            backup: true,
        }
    }
}

impl Settings {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("faed");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {e}, using default settings", path.display());
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("error reading {}: {e}, using default settings", path.display());
                Self::default()
            }
        }
    }

    pub fn effective_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("exports"))
    }

    pub fn effective_backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("backups"))
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faed")
}
