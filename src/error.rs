//! SnapSync Error Types

use thiserror::Error;

/// Result type alias for SnapSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// SnapSync error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Marker errors
    #[error("Marker I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote marker write on {host} failed: {reason}")]
    RemoteWrite { host: String, reason: String },

    // Snapshot engine errors
    #[error("Snapshot engine error: {0}")]
    Engine(String),

    #[error("Unexpected snapshot engine state: {0}")]
    EngineState(String),

    // Administration API errors
    #[error("Admin API transport error: {0}")]
    ApiTransport(#[from] reqwest::Error),

    #[error("Admin API error: {call} returned {status}: {body}")]
    Api {
        call: String,
        status: u16,
        body: String,
    },

    #[error("Admin API did not acknowledge {0}")]
    NotAcknowledged(String),
}

impl Error {
    /// Check whether this error should terminate a daemon loop.
    ///
    /// Configuration and local repository I/O errors are fatal; probe,
    /// admin-API and remote-peer failures are transient and the daemon
    /// skips to the next interval. One-shot runs treat every error as
    /// fatal regardless of class.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::ConfigParse(_) | Error::Io(_))
    }
}
