use std::io;
use thiserror::Error;

/// Unified error type for the geospatial chat assistant
#[derive(Error, Debug)]
pub enum GeoChatError {
    /// Malformed command arity; carries the usage hint for the command
    #[error("Usage: {0}")]
    Usage(String),

    /// Malformed numeric or structured command arguments
    #[error("{0}")]
    Parse(String),

    /// A collaborator answered with an `error` field
    #[error("{0}")]
    Backend(String),

    /// The request never produced a usable answer (connection, timeout, decode)
    #[error("{0}")]
    Transport(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A turn was submitted while another one is still dispatching
    #[error("A request is already in progress, please wait for it to finish")]
    Busy,
}

impl From<reqwest::Error> for GeoChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeoChatError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            GeoChatError::Transport(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            GeoChatError::Transport(format!("Invalid response body: {}", err))
        } else {
            GeoChatError::Transport(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for GeoChatError {
    fn from(err: serde_json::Error) -> Self {
        GeoChatError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for GeoChatError {
    fn from(err: serde_yml::Error) -> Self {
        GeoChatError::Serialization(format!("YAML error: {}", err))
    }
}
