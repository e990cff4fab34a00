//! Settings of the command-line runner

use std::{
    fs,
    path::{Path, PathBuf}
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Settings stored as `config.yaml` in the platform config directory
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_filter:    String,
    /// Whether saved flows omit options left at their default
    pub skip_defaults: bool,
    /// Directory used to resolve flow names given without a path
    pub flows_dir:     Option<PathBuf>
}

impl Default for Settings {
    fn default() -> Self {
        Self { log_filter: "info".to_string(), skip_defaults: true, flows_dir: None }
    }
}

/// Get the project directories for cross-platform config path resolution
pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "actorflow").context("Failed to determine project directories")
}

/// Get the configuration directory path
pub fn get_config_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Get the config file path
pub fn get_config_file_path() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.yaml"))
}

impl Settings {
    /// Load the settings file, writing the defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_file_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Settings::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Resolves a flow argument: existing paths are used as is, bare names are
    /// looked up in `flows_dir`, trying the `.json`, `.yaml` and `.yml` extensions
    pub fn resolve_flow(&self, name: &str) -> PathBuf {
        let path = PathBuf::from(name);
        if path.exists() {
            return path;
        }
        let Some(dir) = &self.flows_dir else {
            return path;
        };

        let candidate = dir.join(name);
        if candidate.exists() || candidate.extension().is_some() {
            return candidate;
        }
        ["json", "yaml", "yml"]
            .iter()
            .map(|ext| candidate.with_extension(ext))
            .find(|p| p.exists())
            .unwrap_or(candidate)
    }
}
