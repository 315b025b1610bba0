//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::websocket::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hub: HubSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener and static file configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory request paths are resolved against
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// Document served for `/`, relative to `static_root`
    #[serde(default = "default_index_document")]
    pub index_document: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_index_document() -> PathBuf {
    PathBuf::from("public/index.html")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_root: default_static_root(),
            index_document: default_index_document(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Broadcast hub configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HubSettings {
    /// Unset means unlimited
    #[serde(default)]
    pub max_connections: Option<usize>,
}

impl From<&HubSettings> for HubConfig {
    fn from(settings: &HubSettings) -> Self {
        HubConfig {
            max_connections: settings.max_connections,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development
    #[default]
    Pretty,
    /// One JSON object per line, for production
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Runs before logging is set up, so nothing is logged here. The caller
    /// reports `source` and `errors` once a subscriber exists.
    pub fn load_default() -> DefaultLoad {
        let candidates: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("relay").join("config.toml")),
            Some(PathBuf::from("./relay.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_from_candidates(&candidates, |key: &str| std::env::var(key).ok())
    }

    /// Try each existing candidate in order; the first that loads wins
    fn load_from_candidates(
        candidates: &[PathBuf],
        lookup: impl Fn(&str) -> Option<String>,
    ) -> DefaultLoad {
        let mut errors = Vec::new();

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(mut config) => {
                    config.apply_overrides(&lookup);
                    return DefaultLoad {
                        config,
                        source: Some(path.clone()),
                        errors,
                    };
                }
                Err(e) => errors.push(e),
            }
        }

        let mut config = Config::default();
        config.apply_overrides(&lookup);
        DefaultLoad {
            config,
            source: None,
            errors,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key: &str| std::env::var(key).ok());
    }

    /// Apply overrides from any key/value source
    ///
    /// Values that fail to parse leave the current setting untouched.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(port) = lookup("PORT") {
            if let Ok(p) = port.trim().parse() {
                self.server.port = p;
            }
        }
        if let Some(host) = lookup("RELAY_HOST") {
            self.server.host = host;
        }
        if let Some(root) = lookup("RELAY_STATIC_ROOT") {
            self.server.static_root = PathBuf::from(root);
        }
        if let Some(index) = lookup("RELAY_INDEX_DOCUMENT") {
            self.server.index_document = PathBuf::from(index);
        }

        // Hub overrides
        if let Some(max) = lookup("RELAY_MAX_CONNECTIONS") {
            if let Ok(m) = max.trim().parse() {
                self.hub.max_connections = Some(m);
            }
        }

        // Logging overrides
        if let Some(level) = lookup("RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("RELAY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
    }
}

/// Result of searching the default config locations
#[derive(Debug)]
pub struct DefaultLoad {
    pub config: Config,
    /// File the config was read from; `None` means defaults plus environment
    pub source: Option<PathBuf>,
    /// Candidate files that exist but failed to load
    pub errors: Vec<ConfigError>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Relay Configuration
#
# Environment variables override these settings:
# - PORT
# - RELAY_HOST
# - RELAY_STATIC_ROOT
# - RELAY_INDEX_DOCUMENT
# - RELAY_MAX_CONNECTIONS
# - RELAY_LOG_LEVEL
# - RELAY_LOG_FORMAT

[server]
# Interface to bind
host = "0.0.0.0"

# Port for both HTTP and WebSocket traffic
port = 3000

# Directory static files are served from
static_root = "."

# Document served for "/" (relative to static_root)
index_document = "public/index.html"

[hub]
# Maximum concurrent WebSocket connections (omit for unlimited)
# max_connections = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
