//! Application configuration
//!
//! Loaded from the platform config directory as TOML when present, falling
//! back to defaults. Every field has a default so partial files work.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BIND_ADDRESS, DEFAULT_HTTP_PORT};
use crate::error::ConfigError;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the web server binds to
    pub bind_address: String,

    /// HTTP/WebSocket port
    pub http_port: u16,

    /// Directory of the operator frontend to serve, if any
    pub frontend_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            frontend_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from the default config path, or defaults when absent
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Platform config file location (`<config dir>/pa-relay/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pa-relay").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parse a specific TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.http_port, 8000);
        assert!(config.server.frontend_dir.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            http_port = 9100
            "#,
        )
        .unwrap();
        assert_eq!(config.server.http_port, 9100);
        assert_eq!(config.server.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_full_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1"
            http_port = 8443
            frontend_dir = "/srv/pa/frontend"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(
            config.server.frontend_dir.as_deref(),
            Some(Path::new("/srv/pa/frontend"))
        );
    }
}
