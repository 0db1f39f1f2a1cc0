//! Monitor Configuration
//!
//! Defaults, optionally overridden by a TOML file and then by command-line
//! flags.

use crate::error::{MonitorError, Result};
use crate::protocol::DEFAULT_JOIN_TYPE;
use crate::stats::DEFAULT_SUMMARY_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

/// Endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:5000/video-stream";

/// Default client id prefix for the join request
pub const DEFAULT_CLIENT_ID_PREFIX: &str = "test_client_";

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// WebSocket endpoint, e.g. `ws://host:5000/video-stream`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Prefix of the self-assigned client id; unix seconds are appended
    #[serde(default = "default_client_id_prefix")]
    pub client_id_prefix: String,

    /// `type` of the join request
    #[serde(default = "default_join_type")]
    pub join_type: String,

    /// Frames between statistics summaries
    #[serde(default = "default_summary_interval")]
    pub summary_interval: u64,

    /// Handshake timeout in seconds (none = wait indefinitely)
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_client_id_prefix() -> String {
    DEFAULT_CLIENT_ID_PREFIX.to_string()
}

fn default_join_type() -> String {
    DEFAULT_JOIN_TYPE.to_string()
}

fn default_summary_interval() -> u64 {
    DEFAULT_SUMMARY_INTERVAL
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            client_id_prefix: default_client_id_prefix(),
            join_type: default_join_type(),
            summary_interval: default_summary_interval(),
            connect_timeout_secs: None,
        }
    }
}

impl MonitorConfig {
    /// Create a configuration for `endpoint` with default settings
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Default config file location (`~/.config/stream-monitor/monitor.toml`)
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("stream-monitor")
            .join("monitor.toml")
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    tracing::info!("Loading configuration from {}", default_path.display());
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the summary interval
    #[must_use]
    pub fn with_summary_interval(mut self, interval: u64) -> Self {
        self.summary_interval = interval;
        self
    }

    /// Set the join request type
    #[must_use]
    pub fn with_join_type(mut self, join_type: impl Into<String>) -> Self {
        self.join_type = join_type.into();
        self
    }

    /// Set the client id prefix
    #[must_use]
    pub fn with_client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client_id_prefix = prefix.into();
        self
    }

    /// Set the handshake timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    /// Handshake timeout as a [`Duration`]
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Check the configuration before connecting
    pub fn validate(&self) -> Result<()> {
        if self.summary_interval == 0 {
            return Err(MonitorError::Config(
                "summary_interval must be at least 1".to_string(),
            ));
        }

        if self.join_type.is_empty() {
            return Err(MonitorError::Config("join_type must not be empty".to_string()));
        }

        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(MonitorError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: "scheme must be ws:// or wss://".to_string(),
            });
        }

        self.endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| MonitorError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.endpoint, "ws://127.0.0.1:5000/video-stream");
        assert_eq!(config.client_id_prefix, "test_client_");
        assert_eq!(config.join_type, "join_viewer");
        assert_eq!(config.summary_interval, 100);
        assert_eq!(config.connect_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MonitorConfig::new("ws://192.168.56.1:5000/video-stream")
            .with_summary_interval(25)
            .with_join_type("join_as_viewer")
            .with_client_id_prefix("probe_")
            .with_connect_timeout(5);

        assert_eq!(config.endpoint, "ws://192.168.56.1:5000/video-stream");
        assert_eq!(config.summary_interval, 25);
        assert_eq!(config.join_type, "join_as_viewer");
        assert_eq!(config.client_id_prefix, "probe_");
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = MonitorConfig::from_toml("endpoint = \"ws://10.0.0.2:8080/frames\"\n").unwrap();
        assert_eq!(config.endpoint, "ws://10.0.0.2:8080/frames");
        assert_eq!(config.summary_interval, 100);
        assert_eq!(config.join_type, "join_viewer");
    }

    #[test]
    fn test_config_serialization() {
        let config = MonitorConfig::default().with_connect_timeout(3);
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = MonitorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "summary_interval = 10").unwrap();
        writeln!(file, "join_type = \"join_as_viewer\"").unwrap();

        let config = MonitorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.summary_interval, 10);
        assert_eq!(config.join_type, "join_as_viewer");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = MonitorConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(MonitorError::Io(_))));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = MonitorConfig::from_toml("summary_interval = \"many\"");
        assert!(matches!(result, Err(MonitorError::ConfigParse(_))));
    }

    #[test]
    fn test_validation() {
        let config = MonitorConfig::default().with_summary_interval(0);
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));

        let config = MonitorConfig::new("http://127.0.0.1:5000/video-stream");
        assert!(matches!(
            config.validate(),
            Err(MonitorError::InvalidEndpoint { .. })
        ));

        let config = MonitorConfig::new("ws://");
        assert!(config.validate().is_err());
    }
}
