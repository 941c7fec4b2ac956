//! Upload error types.

use mediarelay_shared::AppError;
use thiserror::Error;

use crate::provider::ProviderError;

/// Upload pipeline errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request carried no `file` field.
    #[error("No file uploaded")]
    NoFile,

    /// The file exceeded the configured ceiling.
    #[error("File too large")]
    TooLarge {
        /// Maximum allowed size.
        max: u64,
    },

    /// The request body could not be read.
    #[error("{0}")]
    Body(String),

    /// Temp storage failed.
    #[error("temp storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The provider failed or rejected the upload.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The forwarding task ended abnormally.
    #[error("upload task failed: {0}")]
    Task(String),
}

impl UploadError {
    /// Create a body read error.
    #[must_use]
    pub fn body(msg: impl Into<String>) -> Self {
        Self::Body(msg.into())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();
        match err {
            UploadError::NoFile | UploadError::Body(_) => Self::Validation(message),
            UploadError::TooLarge { .. } => Self::PayloadTooLarge(message),
            UploadError::Provider(_) => Self::ExternalService(message),
            UploadError::Io(_) | UploadError::Task(_) => Self::Internal(message),
        }
    }
}
