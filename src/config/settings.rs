//! Application settings and paths.
//!
//! Settings supply defaults for the command line and live in the XDG config
//! directory (`~/.config/interlace/settings.json` on Linux).

use super::engine::{DEFAULT_THREADS, DEFAULT_TIMEOUT_SECS};
use crate::error::{ConfigError, ConfigResult};
use crate::expander::DEFAULT_MAX_HOSTS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/interlace)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the directories for the current user.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "interlace", "interlace")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// User defaults, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default worker count.
    pub threads: usize,
    /// Default per-task timeout in seconds.
    pub timeout_secs: u64,
    /// Default result format (plain, json, csv).
    pub format: String,
    /// Hide the progress bar by default.
    pub no_bar: bool,
    /// Strip colours from command output by default.
    pub no_colour: bool,
    /// Largest expansion accepted for one host spec, 0 for no limit.
    pub max_hosts: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            format: "plain".to_string(),
            no_bar: false,
            no_colour: false,
            max_hosts: DEFAULT_MAX_HOSTS,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults
    /// when no settings file exists.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::discover()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_json::from_str(&content)?)
    }
}
