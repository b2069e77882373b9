//! Error types for nexus3-core
//!
//! Every fallible operation in the core returns [`Result`]. The variants map
//! onto the CLI exit codes, so the binary can report a precise failure kind.

use thiserror::Error;

/// Result type alias for nexus3 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the nexus3 client
#[derive(Debug, Error)]
pub enum Error {
    /// Component path without a repository, or an upload target that the
    /// repository format cannot accept
    #[error("Invalid repository path: {0}")]
    InvalidPath(String),

    /// A management option outside its accepted values
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The named repository does not exist on the service
    #[error("Repository not found: {0}")]
    InvalidRepository(String),

    /// Unexpected HTTP status from the service
    #[error("API error: {0}")]
    Api(String),

    /// HTTP 401 from the service
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Failure retrieving a single artifact
    #[error("Download error: {0}")]
    Download(String),

    /// No upload strategy exists for the repository format
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Transport-level failure (connection refused, TLS, DNS...)
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration file could not be read, parsed or written
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the configuration file simply does not exist yet
    pub fn is_config_missing(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
