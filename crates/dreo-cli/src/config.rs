//! YAML configuration for the `dreo` binary

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dreo_config_entries::{ConfigEntry, ConfigEntrySource};
use dreo_integration::constants::{CONF_AUTO_RECONNECT, CONF_PASSWORD, CONF_USERNAME};
use dreo_integration::DOMAIN;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("'{0}' must not be empty")]
    Empty(&'static str),
}

/// Account and runtime settings
///
/// ```yaml
/// username: me@example.com
/// password: hunter2
/// auto_reconnect: true
/// debug_test_mode_dir: ./fixtures
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DreoConfig {
    pub username: String,
    pub password: String,
    /// Stored as the entry option; left unset the integration default applies
    #[serde(default)]
    pub auto_reconnect: Option<bool>,
    /// Directory holding `debug_test_mode/devices.json`
    #[serde(default)]
    pub debug_test_mode_dir: Option<PathBuf>,
}

impl DreoConfig {
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading config file: {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_yaml(&content).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Empty("username"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Empty("password"));
        }
        Ok(())
    }

    /// The config entry this file describes
    pub fn to_entry(&self) -> ConfigEntry {
        let data = HashMap::from([
            (CONF_USERNAME.to_string(), json!(self.username)),
            (CONF_PASSWORD.to_string(), json!(self.password)),
        ]);
        let mut options = HashMap::new();
        if let Some(auto_reconnect) = self.auto_reconnect {
            options.insert(CONF_AUTO_RECONNECT.to_string(), json!(auto_reconnect));
        }
        ConfigEntry::new(DOMAIN, &self.username)
            .with_data(data)
            .with_options(options)
            .with_unique_id(self.username.to_lowercase())
            .with_source(ConfigEntrySource::Import)
    }
}
