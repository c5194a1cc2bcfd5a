//! Hearthboard configuration management

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main Hearthboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Bridge (local API) configuration
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Artifact store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Remote synchronization configuration
    #[serde(default)]
    pub sync: SyncConfig,
}

impl BoardConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }
}

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7675,
        }
    }
}

/// Artifact store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the artifacts and their version-control working copy
    pub dir: PathBuf,

    /// Override for the device identity (defaults to the sanitized hostname)
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            device: None,
        }
    }
}

/// Remote synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Enable the background sync poller
    pub enabled: bool,

    /// Poll interval in seconds
    pub interval_secs: u64,

    /// Remote name to fetch from
    pub remote: String,

    /// Branch names to try when resolving the remote tip, in order
    pub branches: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            remote: "origin".to_string(),
            branches: vec!["main".to_string(), "master".to_string()],
        }
    }
}

/// Default store directory (~/Desktop/FamilyHomepage/notes)
pub fn default_store_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Desktop")
        .join("FamilyHomepage")
        .join("notes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BoardConfig::default();
        assert_eq!(config.bridge.port, 7675);
        assert!(config.sync.enabled);
        assert_eq!(config.sync.interval_secs, 60);
        assert_eq!(config.sync.branches, vec!["main", "master"]);
        assert!(config.store.device.is_none());
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = BoardConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: BoardConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.bridge.host, config.bridge.host);
        assert_eq!(parsed.sync.remote, "origin");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bridge]\nhost = \"0.0.0.0\"\nport = 8080\n").unwrap();

        let config = BoardConfig::load(&path).unwrap();
        assert_eq!(config.bridge.host, "0.0.0.0");
        assert_eq!(config.bridge.port, 8080);

        assert!(BoardConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: BoardConfig = toml::from_str(
            r#"
            [sync]
            enabled = false
            interval_secs = 5
            remote = "family"
            branches = ["main"]
            "#,
        )
        .unwrap();
        assert!(!parsed.sync.enabled);
        assert_eq!(parsed.sync.interval_secs, 5);
        assert_eq!(parsed.sync.remote, "family");
        // Untouched sections fall back to defaults
        assert_eq!(parsed.bridge.port, 7675);
    }
}
