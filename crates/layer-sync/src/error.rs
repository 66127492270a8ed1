//! Error types for layer synchronization.

use thiserror::Error;

/// Errors that can occur while synchronizing a layer.
#[derive(Error, Debug)]
pub enum LayerSyncError {
    /// A referenced data source or field no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// A field exists but has the wrong type for the requested role.
    #[error("schema error: {0}")]
    Schema(String),

    /// The requested aggregation configuration is unsupported.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Query execution failed on the backend or in transit.
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend response did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LayerSyncError {
    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a Schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a Backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a MalformedResponse error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}

impl From<serde_json::Error> for LayerSyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Result type for layer synchronization operations.
pub type Result<T> = std::result::Result<T, LayerSyncError>;
