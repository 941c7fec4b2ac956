//! Shared fixtures for router tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use mediarelay_core::provider::{MediaProvider, ProviderError, ProviderUpload};
use mediarelay_core::upload::{ResourceKind, TempStore, UploadService};
use mediarelay_shared::config::DEFAULT_MAX_FILE_SIZE;
use serde_json::{Map, Value};
use tempfile::TempDir;

use crate::{AppState, RouterOptions, create_router};

const BOUNDARY: &str = "mediarelay-test-boundary";

/// Mock provider recording what it was asked to upload.
pub struct MockProvider {
    fail_with: Option<String>,
    calls: Mutex<Vec<(ResourceKind, Vec<u8>)>>,
}

impl MockProvider {
    pub fn succeeding() -> Self {
        Self {
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(ResourceKind, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaProvider for MockProvider {
    async fn upload_large(
        &self,
        path: &Path,
        kind: ResourceKind,
    ) -> Result<ProviderUpload, ProviderError> {
        let contents = tokio::fs::read(path).await?;
        let size = contents.len();
        self.calls.lock().unwrap().push((kind, contents));

        if let Some(message) = &self.fail_with {
            return Err(ProviderError::api(400, message.clone()));
        }

        let mut extra = Map::new();
        extra.insert("bytes".to_string(), Value::from(size));
        Ok(ProviderUpload {
            secure_url: "https://media.example.com/abc".to_string(),
            public_id: Some("abc".to_string()),
            resource_type: Some(kind.to_string()),
            extra,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// A router wired to a mock provider and scratch directories.
pub struct TestApp {
    pub provider: Arc<MockProvider>,
    root: TempDir,
    state: AppState,
    options: RouterOptions,
}

impl TestApp {
    pub fn new(provider: MockProvider) -> Self {
        Self::with_max_file_size(provider, DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_file_size(provider: MockProvider, max_file_size: u64) -> Self {
        let root = tempfile::tempdir().unwrap();
        let provider = Arc::new(provider);
        let uploads = UploadService::new(
            TempStore::new(root.path().join("uploads")),
            provider.clone(),
            max_file_size,
        );

        let options = RouterOptions {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            static_dir: root.path().join("build"),
            media_dir: None,
        };

        Self {
            provider,
            state: AppState {
                uploads: Arc::new(uploads),
            },
            options,
            root,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone(), &self.options)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.path().join("uploads")
    }

    pub fn temp_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.temp_dir()).map_or(true, |mut d| d.next().is_none())
    }

    pub fn write_static(&self, relative: &str, contents: &str) {
        let path = self.options.static_dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

/// `Content-Type` header matching [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Encode `(name, filename, content_type, data)` parts as a multipart body.
pub fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content_type, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match file_name {
            Some(file_name) => {
                format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n")
            }
            None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
