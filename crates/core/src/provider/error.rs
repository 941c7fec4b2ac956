//! Provider error types.

use thiserror::Error;

/// Media provider errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider settings are missing or invalid.
    #[error("provider configuration error: {0}")]
    Configuration(String),

    /// Reading the buffered file failed.
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    /// The provider could not be reached.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the upload; `message` is its own wording.
    #[error("{message}")]
    Api {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider error message.
        message: String,
    },

    /// The provider answered with something that is not an upload result.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Storage(String),
}

impl ProviderError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an API rejection error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<opendal::Error> for ProviderError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Storage(err.to_string()),
        }
    }
}
