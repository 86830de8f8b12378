//! Server configuration.
//!
//! Defines the YAML-serializable settings for the HTTP service. Every key is
//! optional; missing keys take their defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! database: data/app.db
//! bind: 127.0.0.1:8080
//! busy_timeout_ms: 5000
//! ```

use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use table_browser_sqlite::StoreOptions;

use crate::error::{Result, ServerError};

/// Top-level service configuration.
///
/// # Examples
///
/// ```
/// # use table_browser_server::ServerConfig;
/// let config: ServerConfig = serde_yaml::from_str("bind: 0.0.0.0:9000").unwrap();
/// assert_eq!(config.bind, "0.0.0.0:9000");
/// assert_eq!(config.busy_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// SQLite database file; created with its parent directory if missing.
    pub database: PathBuf,
    /// Socket address to listen on.
    pub bind: String,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/app.db"),
            bind: "127.0.0.1:8080".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ServerError::IoError) if the file cannot be read,
    /// or [`YamlError`](ServerError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.busy_timeout_ms == 0 {
            return Err(ServerError::InvalidConfig(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.database.as_os_str().is_empty() {
            return Err(ServerError::InvalidConfig("database path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Parses the bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| ServerError::InvalidConfig(format!("invalid bind address '{}': {e}", self.bind)))
    }

    /// Storage options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: ServerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
database: /var/lib/browser/shop.db
bind: 0.0.0.0:3000
busy_timeout_ms: 250
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database, PathBuf::from("/var/lib/browser/shop.db"));
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
        assert_eq!(config.store_options().busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(serde_yaml::from_str::<ServerConfig>("port: 80").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ServerConfig {
            bind: "localhost".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::InvalidConfig(_))));

        let config = ServerConfig {
            busy_timeout_ms: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("browser.yml");
        std::fs::write(&path, "database: shop.db\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.database, PathBuf::from("shop.db"));
        assert_eq!(config.bind, "127.0.0.1:8080");

        assert!(matches!(
            ServerConfig::load(dir.path().join("missing.yml")),
            Err(ServerError::IoError(_))
        ));
    }
}
