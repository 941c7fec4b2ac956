//! Upload relay service implementation.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use super::error::UploadError;
use super::temp::TempStore;
use super::types::{BufferedUpload, UploadPhase};
use crate::provider::{MediaProvider, ProviderUpload};

/// Buffers uploads to temp storage and forwards them to a provider.
///
/// Stateless between requests; one instance is shared by all handlers.
pub struct UploadService {
    store: TempStore,
    provider: Arc<dyn MediaProvider>,
    max_file_size: u64,
}

impl UploadService {
    /// Create a new upload service.
    #[must_use]
    pub fn new(store: TempStore, provider: Arc<dyn MediaProvider>, max_file_size: u64) -> Self {
        Self {
            store,
            provider,
            max_file_size,
        }
    }

    /// Name of the configured provider.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Maximum accepted file size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Temp storage used for buffering.
    #[must_use]
    pub fn store(&self) -> &TempStore {
        &self.store
    }

    /// Write a streamed file body into temp storage.
    ///
    /// Stream errors are converted into `UploadError`, so the caller decides
    /// how a transport failure is classified. The partial file is removed
    /// unless buffering completes, including when this future is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The body stream yields an error
    /// - The file exceeds the size ceiling
    /// - The temp file cannot be created or written
    pub async fn buffer<S, E>(
        &self,
        original_name: &str,
        content_type: &str,
        body: S,
    ) -> Result<BufferedUpload, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<UploadError>,
    {
        let (path, mut file) = self.store.create(original_name).await?;
        let partial = PartialFile::new(path);

        let size = match write_capped(&mut file, body, self.max_file_size).await {
            Ok(size) => size,
            Err(e) => {
                drop(file);
                error!(
                    phase = %UploadPhase::Failed,
                    file = %original_name,
                    error = %e,
                    "Buffering upload failed"
                );
                return Err(e);
            }
        };
        drop(file);
        let path = partial.keep();

        info!(
            phase = %UploadPhase::Buffered,
            file = %original_name,
            bytes = size,
            path = %path.display(),
            "Upload buffered"
        );

        Ok(BufferedUpload {
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size,
            path,
        })
    }

    /// Forward a buffered file to the provider and remove the temp file.
    ///
    /// The forward runs on its own task, so the temp file is removed even if
    /// the caller stops waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or the task aborts.
    pub async fn relay(&self, upload: BufferedUpload) -> Result<ProviderUpload, UploadError> {
        let kind = upload.resource_kind();
        let provider = Arc::clone(&self.provider);
        let name = upload.original_name.clone();
        let path = upload.path.clone();

        info!(
            phase = %UploadPhase::Forwarding,
            file = %name,
            resource_type = %kind,
            provider = provider.name(),
            "Forwarding upload"
        );

        let task = tokio::spawn(async move {
            let result = provider.upload_large(&upload.path, kind).await;
            TempStore::discard(&upload.path).await;
            result
        });

        let result = match task.await {
            Ok(result) => result.map_err(UploadError::from),
            Err(e) => {
                TempStore::discard(&path).await;
                Err(UploadError::Task(e.to_string()))
            }
        };

        match &result {
            Ok(uploaded) => info!(
                phase = %UploadPhase::Completed,
                file = %name,
                url = %uploaded.secure_url,
                "Upload completed"
            ),
            Err(e) => error!(
                phase = %UploadPhase::Failed,
                file = %name,
                error = %e,
                "Upload failed"
            ),
        }

        result
    }
}

/// Removes a temp file that never finished buffering.
///
/// The body stream may be dropped at any await point (client disconnect), so
/// removal happens in `Drop` unless [`PartialFile::keep`] was called.
struct PartialFile {
    path: Option<PathBuf>,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// The file is complete; hand the path over.
    fn keep(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed partial temp file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial temp file"),
        }
    }
}

/// Copy `body` into `file`, failing once more than `max` bytes arrive.
async fn write_capped<S, E>(file: &mut File, body: S, max: u64) -> Result<u64, UploadError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<UploadError>,
{
    let mut body = std::pin::pin!(body);
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(Into::into)?;
        written += chunk.len() as u64;
        if written > max {
            return Err(UploadError::TooLarge { max });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(written)
}
