//! Settings persistence.
//!
//! [`SettingsStore::load`] never fails: a missing, unreadable or corrupt
//! document yields [`AppConfig::default`]. Only [`SettingsStore::save`]
//! reports errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::AppConfig;
use crate::consts::default_settings_path;

/// Where settings come from and go to.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> AppConfig;
    fn save(&self, config: &AppConfig) -> Result<()>;
}

/// Settings kept as a pretty-printed JSON document on disk.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Store at the default per-user location.
    pub fn new() -> Result<Self> {
        let path = default_settings_path().context("cannot determine home directory")?;
        Ok(Self::with_path(path))
    }

    /// Store at an explicit path. Use a temp dir for tests.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> AppConfig {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppConfig::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read settings, using defaults");
                return AppConfig::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "settings file is corrupt, using defaults");
                AppConfig::default()
            }
        }
    }

    fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write settings to {}", self.path.display()))?;
        Ok(())
    }
}

/// Settings that live only as long as the process.
#[derive(Default)]
pub struct MemorySettingsStore {
    config: Mutex<AppConfig>,
}

impl MemorySettingsStore {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> AppConfig {
        self.config.lock().unwrap().clone()
    }

    fn save(&self, config: &AppConfig) -> Result<()> {
        *self.config.lock().unwrap() = config.clone();
        Ok(())
    }
}
