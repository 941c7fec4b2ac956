//! Local filesystem provider using Apache OpenDAL (development only).

use std::path::Path;

use async_trait::async_trait;
use mediarelay_shared::LocalFsConfig;
use opendal::{Operator, services};
use serde_json::{Map, Value};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::info;
use uuid::Uuid;

use super::MediaProvider;
use super::error::ProviderError;
use super::types::ProviderUpload;
use crate::upload::ResourceKind;

const COPY_BUFFER: usize = 1024 * 1024;

/// Stores uploads under a local root and serves them from a base URL.
pub struct LocalFsProvider {
    operator: Operator,
    public_base_url: String,
}

impl LocalFsProvider {
    /// Create a provider rooted at `config.root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path is not valid UTF-8 or the operator
    /// cannot be built.
    pub fn new(config: &LocalFsConfig) -> Result<Self, ProviderError> {
        let root = config
            .root
            .to_str()
            .ok_or_else(|| ProviderError::configuration("invalid path"))?;
        let builder = services::Fs::default().root(root);
        let operator = Operator::new(builder)?.finish();

        Ok(Self {
            operator,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Storage key for a new object.
    ///
    /// Format: `{kind}/{uuid}{.ext}`
    fn storage_key(path: &Path, kind: ResourceKind) -> (String, String) {
        let id = Uuid::new_v4().simple().to_string();
        let ext = path
            .extension()
            .map(|e| sanitize_extension(&e.to_string_lossy()))
            .filter(|e| !e.is_empty())
            .map_or_else(String::new, |e| format!(".{e}"));
        let public_id = format!("{}/{id}", folder(kind));
        (format!("{public_id}{ext}"), public_id)
    }
}

/// Folder (and reported resource type) for a kind.
///
/// Auto-detected files are stored as raw binaries.
fn folder(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Image => "image",
        ResourceKind::Video => "video",
        ResourceKind::Auto => "raw",
    }
}

/// Keep only characters that are safe in a storage key.
fn sanitize_extension(ext: &str) -> String {
    ext.chars().filter(char::is_ascii_alphanumeric).collect()
}

#[async_trait]
impl MediaProvider for LocalFsProvider {
    async fn upload_large(
        &self,
        path: &Path,
        kind: ResourceKind,
    ) -> Result<ProviderUpload, ProviderError> {
        let (key, public_id) = Self::storage_key(path, kind);
        let mut file = File::open(path).await?;
        let mut writer = self.operator.writer(&key).await?;

        let mut total = 0u64;
        let mut buf = vec![0u8; COPY_BUFFER];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write(buf[..n].to_vec()).await?;
            total += n as u64;
        }
        writer.close().await?;

        info!(key = %key, bytes = total, "Stored upload on local filesystem");

        let mut extra = Map::new();
        extra.insert("bytes".to_string(), Value::from(total));
        extra.insert("storage".to_string(), Value::from("local"));

        Ok(ProviderUpload {
            secure_url: format!("{}/{key}", self.public_base_url),
            public_id: Some(public_id),
            resource_type: Some(folder(kind).to_string()),
            extra,
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
