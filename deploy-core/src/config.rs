//! Global configuration: settings that apply across profiles (default
//! concurrency, default retry tuning, default protocol timeouts).

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("config directory unavailable")]
    DirUnavailable,
}

fn default_concurrency() -> usize {
    crate::upload::DEFAULT_CONCURRENCY
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

/// Global, profile-independent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_concurrency: default_concurrency(),
            connect_timeout_secs: default_connect_timeout_secs(),
            default_max_retries: default_max_retries(),
        }
    }
}

impl GlobalConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Loads the config file at the default location
    /// (`~/.config/deploy-tool/config.json`), falling back to defaults if it
    /// doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DirUnavailable`] if no config directory can be
    /// determined, or [`ConfigError::Json`] if the file exists but is
    /// malformed.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        Self::load_from(&path)
    }

    /// Loads the config file at `path`, falling back to defaults if it
    /// doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::DirUnavailable)?;
    Ok(base.join("deploy-tool").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_sensible_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.default_concurrency, 4);
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_missing_path_returns_default() {
        let config = GlobalConfig::load_from(std::path::Path::new("/no/such/config.json")).unwrap();
        assert_eq!(config.default_max_retries, 5);
    }

    #[test]
    fn test_load_from_partial_json_fills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_concurrency": 8}"#).unwrap();

        let config = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(config.default_concurrency, 8);
        assert_eq!(config.default_max_retries, 5);
    }
}
