//! Configuration management
//!
//! The client configuration (service URL, credentials, TLS verification and
//! REST API version) is stored as TOML in the user's config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "NEXUS3_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Nexus REST API version used to build endpoint URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    #[default]
    V1,
    /// Pre-3.18 servers expose search and upload under `beta`
    Beta,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::Beta => "beta",
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" => Ok(ApiVersion::V1),
            "beta" => Ok(ApiVersion::Beta),
            _ => Err(format!("Invalid API version: {s}")),
        }
    }
}

/// Connection settings for a Nexus 3 service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the service, e.g. `http://localhost:8081`
    pub url: String,
    pub username: String,
    pub password: String,
    /// Validate the server certificate on https connections
    pub x509_verify: bool,
    pub api_version: ApiVersion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "http://localhost:8081".to_string(),
            username: "admin".to_string(),
            password: "admin123".to_string(),
            x509_verify: true,
            api_version: ApiVersion::V1,
        }
    }
}

/// Loads and saves [`Config`] on disk
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use the default location: `$NEXUS3_CONFIG_DIR/config.toml` when the
    /// variable is set, otherwise `<config dir>/nexus3/config.toml`
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?
                .join("nexus3"),
        };

        Ok(Self::with_path(dir.join(CONFIG_FILE_NAME)))
    }

    /// Use an explicit configuration file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the configuration file
    ///
    /// A missing file is reported as [`Error::Io`] with `NotFound`; see
    /// [`Error::is_config_missing`].
    pub fn load(&self) -> Result<Config> {
        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", self.path.display())))
    }

    /// Write the configuration file, readable by the owner only
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}
