//! Host configuration
//!
//! Resolution order: built-in defaults, then `config.toml` in the data
//! directory (or the file named by `IGSWAP_CONFIG`), then the
//! `IGSWAP_DATABASE` and `IGSWAP_DOMAIN` environment variables.

use igswap_session::SiteConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Site whose cookies are captured and swapped
    pub site: SiteConfig,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("igswap.db"),
            site: SiteConfig::default(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("igswap"))
            .unwrap_or_else(|| PathBuf::from(".igswap"))
    }

    /// Load from the default locations and the process environment
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("IGSWAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::data_dir().join("config.toml"));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Loaded configuration file");

        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("IGSWAP_DATABASE").filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(domain) = lookup("IGSWAP_DOMAIN").filter(|v| !v.is_empty()) {
            self.site.domain = domain;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.site.domain.trim_start_matches('.').is_empty() {
            return Err(CoreError::Config("site.domain cannot be empty".to_string()));
        }
        if self.site.auth_cookie.is_empty() {
            return Err(CoreError::Config("site.auth_cookie cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
