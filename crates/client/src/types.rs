//! Client-side data types.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;

use crate::error::ClientError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Where the bytes of a selected file come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on disk, streamed when uploaded.
    Path(PathBuf),
    /// Bytes already in memory.
    Bytes(Bytes),
}

/// A file the user picked for upload.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Display name (file name without directories).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Declared content type.
    pub content_type: String,
    /// Byte source.
    pub source: FileSource,
}

impl SelectedFile {
    /// Select a file on disk, guessing its content type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            name,
            size: metadata.len(),
            content_type: guess_content_type(path),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Select in-memory bytes.
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type: content_type.into(),
            source: FileSource::Bytes(bytes),
        }
    }
}

fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// A completed upload as shown in the result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Original file name. Not unique.
    pub name: String,
    /// Durable public URL.
    pub url: String,
    /// Provider identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    /// Provider resource type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}
