//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files: bind address, database path, and the
//! engine policy table.

use pulse_engine::EngineConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Engine policy (governance mode, penalty curve, timezone)
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;

        if config.database_path.is_empty() {
            return Err(ConfigError::MissingField("database_path".to_string()));
        }

        Ok(config)
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            database_path: "pulse.db".to_string(),
            engine: EngineConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_domain::GovernanceMode;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.engine.mode, GovernanceMode::Propose);
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            database_path = "/var/lib/pulse/pulse.db"

            [engine]
            mode = "auto"
            utc_offset_minutes = 240
            unanswered_threshold_days = 5

            [engine.penalty_curve]
            kind = "linear"
            slope = 0.8
        "#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.engine.mode, GovernanceMode::Auto);
        assert_eq!(config.engine.utc_offset_minutes, 240);
        assert_eq!(config.engine.unanswered_threshold_days, 5);
    }

    #[test]
    fn test_engine_table_defaults() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            database_path = "pulse.db"
        "#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.mode, GovernanceMode::Propose);
        assert_eq!(config.engine.recent_window_days, 7);
    }
}
