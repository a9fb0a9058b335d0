//! Server error types.

use thiserror::Error;
use trench_protocol::ProtocolError;

/// Errors that stop the server from starting or running.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Socket or file I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::ServerConfig`].
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A command-line argument could not be understood.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A packet could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The transport's I/O thread is gone.
    #[error("transport closed")]
    TransportClosed,
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
