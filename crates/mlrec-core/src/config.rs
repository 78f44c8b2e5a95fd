//! Configuration management for mlrec.
//!
//! Loads configuration from ${MLREC_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Base URL of the ML service when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for mlrec configuration and credential files.
    //!
    //! MLREC_HOME resolution order:
    //! 1. MLREC_HOME environment variable (if set)
    //! 2. ~/.config/mlrec (default)

    use std::path::PathBuf;

    /// Returns the mlrec home directory.
    pub fn mlrec_home() -> PathBuf {
        if let Ok(home) = std::env::var("MLREC_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".mlrec"),
            |h| h.join(".config").join("mlrec"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        mlrec_home().join("config.toml")
    }

    /// Returns the path to the stored credential.
    pub fn token_path() -> PathBuf {
        mlrec_home().join("token.json")
    }
}

/// Display policy for the recommendations operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationsConfig {
    /// Value sent as `n_recommendations`.
    pub request_count: u32,
    /// Maximum number of movies rendered from the response.
    pub display_limit: usize,
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            request_count: 10,
            display_limit: 8,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the ML service (e.g. `http://localhost:8000`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Directory holding template overrides (`train.html`, `status.html`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<String>,

    #[serde(default)]
    pub recommendations: RecommendationsConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        write_config(path, default_config_template())
    }

    /// Serializes the effective configuration back to TOML.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Returns the configured base URL if set and non-empty.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the template override directory, if configured.
    pub fn templates_dir(&self) -> Option<PathBuf> {
        self.templates_dir
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}

/// Resolves a base URL with precedence: override (flag or `MLREC_BASE_URL`) > config > default.
///
/// Trailing slashes are stripped so endpoint paths can be appended directly.
///
/// # Errors
/// Returns an error if the selected URL is malformed.
pub fn resolve_base_url(override_url: Option<&str>, config_url: Option<&str>) -> Result<String> {
    let chosen = [override_url, config_url]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty());

    match chosen {
        Some(url) => {
            url::Url::parse(url).with_context(|| format!("Invalid ML service base URL: {url}"))?;
            Ok(url.trim_end_matches('/').to_string())
        }
        None => Ok(DEFAULT_BASE_URL.to_string()),
    }
}

/// Writes config content to a file, creating parent directories as needed.
/// Uses atomic write (temp file + rename) to prevent corruption.
fn write_config(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, content)
        .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}
