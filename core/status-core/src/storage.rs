//! Storage paths and the JSON-file settings backend.
//!
//! Hosts that persist settings themselves implement
//! [`SettingsPersistence`](crate::host::SettingsPersistence) directly; the
//! headless shell uses [`JsonSettingsFile`].
//!
//! # Defensive loading
//!
//! A missing, empty or corrupt file loads as "nothing saved", so the engine
//! starts from defaults instead of failing. Saves go through a temp file and
//! rename so a crash mid-write never leaves a truncated file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use tempfile::NamedTempFile;

use crate::error::{Result, StatusError};
use crate::host::SettingsPersistence;
use crate::settings::Settings;

/// Central configuration for storage paths.
///
/// Production code uses `StorageConfig::default()` which points to
/// `~/.steam-status/`. Tests use `StorageConfig::with_root(temp_dir)`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            root: home.join(".steam-status"),
        }
    }
}

impl StorageConfig {
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to settings.json (the persisted settings record).
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Path to logs/ directory (rolling log files).
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

/// Settings persisted as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_storage(storage: &StorageConfig) -> Self {
        Self::new(storage.settings_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Settings>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StatusError::Io {
                    path: self.path.clone(),
                    source: err,
                })
            }
        };

        if content.trim().is_empty() {
            tracing::warn!(path = %self.path.display(), "Empty settings file; using defaults");
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StatusError::Json {
                context: format!("parsing {}", self.path.display()),
                source,
            })
    }
}

impl SettingsPersistence for JsonSettingsFile {
    fn load(&self) -> Option<Settings> {
        match self.read() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load settings; using defaults");
                None
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|source| StatusError::Io {
            path: parent.to_path_buf(),
            source,
        })?;

        let content = serde_json::to_string_pretty(settings).map_err(|source| StatusError::Json {
            context: "serializing settings".to_string(),
            source,
        })?;

        let io_err = |source| StatusError::Io {
            path: self.path.clone(),
            source,
        };
        let mut temp_file = NamedTempFile::new_in(parent).map_err(io_err)?;
        temp_file.write_all(content.as_bytes()).map_err(io_err)?;
        temp_file.flush().map_err(io_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| io_err(err.error))?;

        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
