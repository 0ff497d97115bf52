//! Plugin configuration for package loading
//!
//! Describes where installed provider plugins live. The package loader builds
//! its plugin host from this configuration.
//!
//! ```toml
//! plugin_dirs = ["~/.pulumi/plugins", "/opt/plugins"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-user plugin cache, relative to the home directory
const DEFAULT_PLUGIN_DIR: &[&str] = &[".pulumi", "plugins"];

/// Error type for plugin configuration loading
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file exists but could not be read
    Io(PathBuf, std::io::Error),
    /// The configuration file is not valid TOML for `PluginsConfig`
    Parse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, err) => {
                write!(f, "Failed to read plugin config {}: {}", path.display(), err)
            }
            ConfigError::Parse(path, err) => {
                write!(f, "Failed to parse plugin config {}: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, err) => Some(err),
            ConfigError::Parse(_, err) => Some(err),
        }
    }
}

/// Locations searched for installed plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Directories searched in order; the first match wins
    #[serde(default = "default_plugin_dirs")]
    pub plugin_dirs: Vec<PathBuf>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        PluginsConfig {
            plugin_dirs: default_plugin_dirs(),
        }
    }
}

impl PluginsConfig {
    /// Configuration searching only the given directories
    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        PluginsConfig {
            plugin_dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Load configuration from a TOML file, returning the default if it doesn't exist
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(PluginsConfig::default());
        }

        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config: PluginsConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.plugin_dirs = config
            .plugin_dirs
            .iter()
            .map(|dir| expand_tilde(dir))
            .collect();
        Ok(config)
    }

    /// Plugin directories that currently exist on disk
    pub fn existing_dirs(&self) -> impl Iterator<Item = &Path> {
        self.plugin_dirs
            .iter()
            .map(PathBuf::as_path)
            .filter(|dir| dir.is_dir())
    }
}

fn default_plugin_dirs() -> Vec<PathBuf> {
    match dirs::home_dir() {
        Some(home) => vec![DEFAULT_PLUGIN_DIR.iter().fold(home, |p, seg| p.join(seg))],
        None => Vec::new(),
    }
}

/// Expand a leading `~` to the home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        // If home directory cannot be determined, return path as-is
        None => path.to_path_buf(),
    }
}
