//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ReconnectPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

fn default_url() -> String {
    "ws://localhost:9001".to_string()
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_connect_timeout() -> u64 {
    10_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_delay_ms: default_reconnect_delay(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

impl ClientConfig {
    /// Reconnect policy for the store
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::from_millis(self.reconnect_delay_ms)
    }

    /// WebSocket handshake timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Display identity stamped on outbound messages
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "guest".to_string())
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            display_name: None,
        }
    }
}

impl IdentityConfig {
    /// Display name, falling back to the username
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
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

    /// Parse configuration from TOML text
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
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chatsync").join("config.toml")),
            Some(PathBuf::from("/etc/chatsync/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Client overrides
        if let Some(url) = var("CHATSYNC_URL") {
            self.client.url = url;
        }
        if let Some(delay) = var("CHATSYNC_RECONNECT_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                self.client.reconnect_delay_ms = ms;
            }
        }
        if let Some(timeout) = var("CHATSYNC_CONNECT_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.client.connect_timeout_ms = ms;
            }
        }

        // Identity overrides
        if let Some(username) = var("CHATSYNC_USERNAME") {
            self.identity.username = username;
        }
        if let Some(display_name) = var("CHATSYNC_DISPLAY_NAME") {
            self.identity.display_name = Some(display_name);
        }

        // Logging overrides
        if let Some(level) = var("CHATSYNC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CHATSYNC_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
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
    r#"# Chatsync Configuration
#
# Environment variables override these settings:
# - CHATSYNC_URL
# - CHATSYNC_RECONNECT_DELAY_MS
# - CHATSYNC_CONNECT_TIMEOUT_MS
# - CHATSYNC_USERNAME
# - CHATSYNC_DISPLAY_NAME
# - CHATSYNC_LOG_LEVEL
# - CHATSYNC_LOG_FORMAT

[client]
# Message server WebSocket URL
url = "ws://localhost:9001"

# Delay before reconnecting after the connection drops (ms)
reconnect_delay_ms = 3000

# WebSocket handshake timeout (ms)
connect_timeout_ms = 10000

[identity]
# Name stamped on outbound messages
username = "guest"

# Optional display name (defaults to username)
# display_name = "Guest"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.client.url, "ws://localhost:9001");
        assert_eq!(config.client.reconnect_delay_ms, 3000);
        assert_eq!(
            config.client.reconnect_policy().delay(),
            Duration::from_millis(3000)
        );
        assert_eq!(config.client.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_default_config_template_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.client.url, "ws://localhost:9001");
        assert_eq!(config.client.reconnect_delay_ms, 3000);
        assert_eq!(config.identity.username, "guest");
        assert_eq!(config.identity.display_name(), "guest");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_identity_only_stamps_names() {
        assert!(!generate_default_config().contains("avatar"));

        let config = Config::parse("[identity]\nusername = \"ada\"").unwrap();
        let author = crate::store::Author::local(
            config.identity.username.as_str(),
            config.identity.display_name(),
        );
        assert_eq!(author.display_name, "ada");
        assert!(author.avatar.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[client]\nreconnect_delay_ms = 500\n\n[identity]\nusername = \"ada\"\ndisplay_name = \"Ada\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.client.reconnect_delay_ms, 500);
        assert_eq!(config.client.url, "ws://localhost:9001");
        assert_eq!(config.identity.display_name(), "Ada");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_errors() {
        let missing = Path::new("/nonexistent/chatsync.toml");
        assert!(matches!(Config::load(missing), Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client\nurl = ").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CHATSYNC_URL", "wss://chat.example.com"),
            ("CHATSYNC_RECONNECT_DELAY_MS", "1500"),
            ("CHATSYNC_CONNECT_TIMEOUT_MS", "not a number"),
            ("CHATSYNC_DISPLAY_NAME", "Ada L."),
            ("CHATSYNC_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.client.url, "wss://chat.example.com");
        assert_eq!(config.client.reconnect_delay_ms, 1500);
        assert_eq!(config.client.connect_timeout_ms, 10_000);
        assert_eq!(config.identity.display_name(), "Ada L.");
        assert_eq!(config.logging.format, "json");
    }
}
