//! Configuration module
//!
//! Reads TOML configuration (default ~/.config/nobil-sync/config.toml,
//! overridable with the NOBIL_SYNC_CONFIG environment variable). Every
//! field has a default so the service starts without a config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{SyncError, SyncResult};

/// Vendor endpoints and credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    pub api_key: String,
    /// Realtime stream endpoint, without the apikey query parameter
    pub stream_url: String,
    /// Bulk datadump endpoint, without the apikey query parameter
    pub datadump_url: String,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            stream_url: "ws://realtime.nobil.no/api/v1/stream".to_string(),
            datadump_url: "https://nobil.no/api/server/datadump.php?countrycode=NOR&format=json"
                .to_string(),
        }
    }
}

/// Snapshot HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The single origin allowed by the CORS policy
    pub cors_origin: String,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Durable storage location for the served artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./api"),
        }
    }
}

/// Keepalive probe cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    pub interval_secs: u64,
}

impl KeepaliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// Persistence cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Delay before the first write
    pub warmup_secs: u64,
    pub interval_secs: u64,
}

impl PersistenceConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            warmup_secs: 10,
            interval_secs: 60,
        }
    }
}

/// Station-metadata refresh (vendor datadump), disabled by default
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationsConfig {
    pub refresh: bool,
    pub interval_secs: u64,
}

impl StationsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            refresh: false,
            interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub vendor: VendorConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub keepalive: KeepaliveConfig,
    pub persistence: PersistenceConfig,
    pub stations: StationsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&raw).map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Stream URL with the API key attached as a query parameter
    pub fn stream_url(&self) -> String {
        with_api_key(&self.vendor.stream_url, &self.vendor.api_key)
    }

    /// Datadump URL with the API key attached as a query parameter
    pub fn datadump_url(&self) -> String {
        with_api_key(&self.vendor.datadump_url, &self.vendor.api_key)
    }
}

fn with_api_key(url: &str, api_key: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}apikey={}", url, separator, api_key)
}

/// Default configuration file path (~/.config/nobil-sync/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nobil-sync")
        .join("config.toml")
}
