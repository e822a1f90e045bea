//! Configuration management for uptable CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Last directory a package was opened from
    pub open_dir: Option<PathBuf>,

    /// Last directory a property file was saved to
    pub save_dir: Option<PathBuf>,

    /// Default for CSV formula escaping
    #[serde(default)]
    pub formula_escape: bool,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("uptable");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Resolve a package path, falling back to `open_dir` for relative paths
    /// that do not exist in the working directory
    pub fn resolve_input(&self, path: &Path) -> PathBuf {
        resolve_against(path, self.open_dir.as_deref())
    }

    /// Resolve an output path, falling back to `save_dir` for relative paths
    /// whose parent does not exist in the working directory
    pub fn resolve_output(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let parent_exists = path
            .parent()
            .map(|p| p.as_os_str().is_empty() || p.exists())
            .unwrap_or(true);
        match &self.save_dir {
            Some(dir) if !parent_exists => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Record the directory of an opened package
    pub fn remember_open(&mut self, path: &Path) -> bool {
        remember(&mut self.open_dir, path)
    }

    /// Record the directory of a saved property file
    pub fn remember_save(&mut self, path: &Path) -> bool {
        remember(&mut self.save_dir, path)
    }
}

fn resolve_against(path: &Path, dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(dir) if path.is_relative() && !path.exists() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// Store the absolute parent directory of `path`; returns whether it changed
fn remember(slot: &mut Option<PathBuf>, path: &Path) -> bool {
    let Some(dir) = fs::canonicalize(path)
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    else {
        return false;
    };
    if slot.as_deref() == Some(dir.as_path()) {
        return false;
    }
    *slot = Some(dir);
    true
}
