//! Error types for the am-client service layer.

use std::path::PathBuf;

/// Client error type that wraps errors from the domain and storage crates
/// and the failures of talking to a server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Domain validation failure, shown verbatim.
    #[error("{0}")]
    Core(String),

    #[error("Results error: {0}")]
    Results(String),

    /// Rejected request arguments, shown verbatim.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Unable to connect to server {target}: {message}")]
    Connection { target: String, message: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    #[error("{message}")]
    LocalServer { message: String },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for am-client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<am_core::CoreError> for ClientError {
    fn from(err: am_core::CoreError) -> Self {
        ClientError::Core(err.to_string())
    }
}

impl From<am_results::ResultsError> for ClientError {
    fn from(err: am_results::ResultsError) -> Self {
        ClientError::Results(err.to_string())
    }
}

impl From<serde_yaml::Error> for ClientError {
    fn from(err: serde_yaml::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}
