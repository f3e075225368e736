//! Server configuration.
//!
//! Settings live in a `config.toml` file, by default in the working
//! directory:
//!
//! ```toml
//! bind_address = "0.0.0.0"
//! port = 8070
//! preferences_path = "preferences.json"
//!
//! [feed]
//! allowed_prefixes = ["https://hplanning"]
//! timeout_secs = 30
//! ```

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use hypercal_feeds::FetcherConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file cannot be read or written.
    #[error("Cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for this configuration.
    #[error("Cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The defaults cannot be serialized.
    #[error("Cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_address: IpAddr,

    /// Port to listen on.
    pub port: u16,

    /// File holding the registered preferences.
    pub preferences_path: PathBuf,

    /// Feed download settings.
    pub feed: FeedSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: Self::DEFAULT_PORT,
            preferences_path: PathBuf::from("preferences.json"),
            feed: FeedSettings::default(),
        }
    }
}

/// Feed download settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// URL prefixes accepted as feeds.
    pub allowed_prefixes: Vec<String>,

    /// Download timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent to feed servers.
    pub user_agent: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec![FetcherConfig::DEFAULT_ALLOWED_PREFIX.to_string()],
            timeout_secs: FetcherConfig::DEFAULT_TIMEOUT_SECS,
            user_agent: FetcherConfig::default_user_agent(),
        }
    }
}

impl FeedSettings {
    /// Builds the fetcher settings.
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::default()
            .with_allowed_prefixes(self.allowed_prefixes.iter().cloned())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_user_agent(&self.user_agent)
    }
}

impl ServerConfig {
    /// Default listening port.
    pub const DEFAULT_PORT: u16 = 8070;

    /// Parses a configuration from TOML text.
    pub fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &content)
    }

    /// Loads the configuration at `path`, falling back to the defaults.
    ///
    /// A missing file is created with the defaults. A file that cannot be
    /// read or parsed is logged and left untouched.
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!(path = %path.display(), "Wrote default configuration"),
                Err(e) => error!(error = %e, "Cannot write default configuration"),
            }
            return config;
        }

        Self::load_from(path).unwrap_or_else(|e| {
            error!(error = %e, "Configuration unusable, using defaults");
            Self::default()
        })
    }

    /// Writes the configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builder: set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder: set the preferences file.
    pub fn with_preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_path = path.into();
        self
    }

    /// Returns the socket address to listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8070);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8070");
        assert_eq!(config.preferences_path, PathBuf::from("preferences.json"));
        assert_eq!(config.feed.allowed_prefixes, vec!["https://hplanning".to_string()]);
        assert_eq!(config.feed.timeout_secs, 30);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ServerConfig::from_toml(
            Path::new("config.toml"),
            "port = 9000\n[feed]\ntimeout_secs = 5\n",
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.feed.timeout_secs, 5);
        assert_eq!(config.feed.allowed_prefixes, vec!["https://hplanning".to_string()]);
        assert_eq!(config.preferences_path, PathBuf::from("preferences.json"));
    }

    #[test]
    fn fetcher_config_from_settings() {
        let settings = FeedSettings {
            allowed_prefixes: vec!["https://edt.example".to_string()],
            timeout_secs: 10,
            user_agent: "test-agent".to_string(),
        };
        let fetcher = settings.fetcher_config();

        assert_eq!(fetcher.allowed_prefixes, vec!["https://edt.example".to_string()]);
        assert_eq!(fetcher.timeout, Duration::from_secs(10));
        assert_eq!(fetcher.user_agent, "test-agent");
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = ServerConfig::load_or_init(&path);
        assert_eq!(config, ServerConfig::default());
        assert!(path.exists());
        assert_eq!(ServerConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn corrupted_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();

        assert!(matches!(
            ServerConfig::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(ServerConfig::load_or_init(&path), ServerConfig::default());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "port = \"not a number\""
        );
    }

    #[test]
    fn builder_methods() {
        let config = ServerConfig::default()
            .with_port(8080)
            .with_preferences_path("/var/lib/hypercal/preferences.json");

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.preferences_path,
            PathBuf::from("/var/lib/hypercal/preferences.json")
        );
    }
}
