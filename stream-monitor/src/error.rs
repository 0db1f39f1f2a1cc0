//! Error types for stream monitoring operations

use thiserror::Error;

/// Result type alias for stream monitoring operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while monitoring a video stream
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Endpoint cannot be turned into a WebSocket client request
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The rejected endpoint
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// Invalid monitor configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// WebSocket handshake did not complete in time
    #[error("Connection to {0} timed out")]
    ConnectTimeout(String),

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// Outbound message could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
