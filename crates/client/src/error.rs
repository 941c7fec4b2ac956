//! Client error types.

use thiserror::Error;

/// Errors surfaced by the upload client.
///
/// The display string is what the user sees after `Upload failed: `.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The selected file is above the ceiling; no request was made.
    #[error("File size must be below 100MB")]
    FileTooLarge {
        /// Size of the rejected file.
        size: u64,
        /// Ceiling in bytes.
        max: u64,
    },

    /// The server could not be reached or the transfer broke.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-supplied `error` text, or a generic status message.
        message: String,
    },

    /// A success response that could not be used.
    #[error("{0}")]
    MalformedResponse(String),

    /// Reading the local file failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Error for a non-success response without a usable body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::Server {
            status,
            message: format!("Request failed with status code {status}"),
        }
    }
}
