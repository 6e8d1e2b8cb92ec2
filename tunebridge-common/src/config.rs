//! Configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable (`TUNEBRIDGE_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: defaults are used and a warning is
//! logged. A TOML file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Largest number of items the destination accepts per append call
pub const MAX_BATCH_SIZE: usize = 100;

const DEFAULT_SOURCE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_DESTINATION_BASE_URL: &str = "https://api.spotify.com/v1";

/// Complete TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub transfer: TransferConfig,
    pub server: ServerConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Optional log file; logs go to stderr when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// `[source]` section: the catalog playlists are read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    /// Maximum number of tracks read from a source playlist
    pub page_limit: usize,
    pub requests_per_second: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            page_limit: 100,
            requests_per_second: 5,
        }
    }
}

/// `[destination]` section: the catalog that is searched and written to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Bearer token obtained out of band; never refreshed here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub base_url: String,
    pub requests_per_second: u32,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: DEFAULT_DESTINATION_BASE_URL.to_string(),
            requests_per_second: 5,
        }
    }
}

/// `[transfer]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Track ids per destination append call
    pub batch_size: usize,
    /// Capacity of the progress event channel
    pub event_buffer: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            event_buffer: 16,
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
        }
    }
}

/// Default config file location: `<config_dir>/tunebridge/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunebridge").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

impl TomlConfig {
    /// Load configuration from an explicit path or the default location,
    /// then apply environment overrides.
    ///
    /// An explicit path must exist. The default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                info!("Loading config from {}", path.display());
                load_toml_config(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    info!("Loading config from {}", path.display());
                    load_toml_config(&path)?
                }
                Some(path) => {
                    warn!(
                        "Config file not found at {}, using defaults",
                        path.display()
                    );
                    TomlConfig::default()
                }
                None => {
                    warn!("Could not determine config directory, using defaults");
                    TomlConfig::default()
                }
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay `TUNEBRIDGE_*` environment variables onto file values
    pub fn apply_env_overrides(&mut self) {
        if let Some(level) = env_value::<String>("TUNEBRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(file) = env_value::<PathBuf>("TUNEBRIDGE_LOG_FILE") {
            self.logging.file = Some(file);
        }
        if let Some(key) = env_value::<String>("TUNEBRIDGE_SOURCE_API_KEY") {
            self.source.api_key = Some(key);
        }
        if let Some(url) = env_value::<String>("TUNEBRIDGE_SOURCE_BASE_URL") {
            self.source.base_url = url;
        }
        if let Some(limit) = env_value::<usize>("TUNEBRIDGE_PAGE_LIMIT") {
            self.source.page_limit = limit;
        }
        if let Some(token) = env_value::<String>("TUNEBRIDGE_DESTINATION_TOKEN") {
            self.destination.access_token = Some(token);
        }
        if let Some(url) = env_value::<String>("TUNEBRIDGE_DESTINATION_BASE_URL") {
            self.destination.base_url = url;
        }
        if let Some(size) = env_value::<usize>("TUNEBRIDGE_BATCH_SIZE") {
            self.transfer.batch_size = size;
        }
        if let Some(port) = env_value::<u16>("TUNEBRIDGE_PORT") {
            self.server.port = port;
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.transfer.batch_size == 0 || self.transfer.batch_size > MAX_BATCH_SIZE {
            return Err(Error::Config(format!(
                "transfer.batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.transfer.batch_size
            )));
        }
        if self.transfer.event_buffer == 0 {
            return Err(Error::Config(
                "transfer.event_buffer must be at least 1".to_string(),
            ));
        }
        if self.source.page_limit == 0 {
            return Err(Error::Config(
                "source.page_limit must be at least 1".to_string(),
            ));
        }
        if self.source.requests_per_second == 0 || self.destination.requests_per_second == 0 {
            return Err(Error::Config(
                "requests_per_second must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read and parse an environment variable, ignoring blank values
fn env_value<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => {
            debug!("Config override from {}", name);
            Some(value)
        }
        Err(_) => {
            warn!("Ignoring unparseable value in {}", name);
            None
        }
    }
}

/// Write a config file atomically (temp file + rename)
///
/// The file may hold credentials, so on Unix it is created with mode 0600.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}
