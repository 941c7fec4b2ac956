//! Cloudinary provider using the chunked large-file upload API.
//!
//! A file is sent as one or more signed multipart POSTs sharing an
//! `X-Unique-Upload-Id`. Each POST carries a `Content-Range` header so the
//! provider can reassemble the parts; the response to the last part is the
//! upload result.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use mediarelay_shared::{CloudinaryConfig, SignatureAlgorithm};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::ProviderError;
use super::types::ProviderUpload;
use super::MediaProvider;
use crate::upload::ResourceKind;

/// Cloudinary media provider.
pub struct CloudinaryProvider {
    client: Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryProvider {
    /// Create a provider from credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential is empty, the chunk size is zero, or
    /// the HTTP client cannot be built.
    pub fn new(config: CloudinaryConfig) -> Result<Self, ProviderError> {
        if config.cloud_name.is_empty() {
            return Err(ProviderError::configuration("cloudinary cloud_name is not set"));
        }
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(ProviderError::configuration(
                "cloudinary api_key and api_secret must be set",
            ));
        }
        if config.chunk_size == 0 {
            return Err(ProviderError::configuration("chunk_size must be positive"));
        }

        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Upload endpoint for a resource kind.
    #[must_use]
    pub fn upload_url(&self, kind: ResourceKind) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            kind
        )
    }

    /// Sign request parameters.
    ///
    /// The string to sign is the parameters sorted by name and joined as
    /// `k=v&k=v`, immediately followed by the API secret.
    #[must_use]
    pub fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let payload = format!("{to_sign}{}", self.config.api_secret);

        match self.config.signature_algorithm {
            SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
            SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
        }
    }

    /// Form fields shared by every chunk of one upload.
    fn signed_fields(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = BTreeMap::new();
        params.insert("timestamp", timestamp.to_string());
        let signature = self.sign(&params);

        vec![
            ("api_key", self.config.api_key.clone()),
            ("timestamp", timestamp.to_string()),
            ("signature", signature),
        ]
    }

    async fn send_chunk(
        &self,
        url: &str,
        upload_id: &str,
        fields: &[(&'static str, String)],
        file_name: &str,
        chunk: Vec<u8>,
        content_range: Option<String>,
    ) -> Result<bytes::Bytes, ProviderError> {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(*name, value.clone());
        }
        form = form.part("file", Part::bytes(chunk).file_name(file_name.to_string()));

        let mut request = self
            .client
            .post(url)
            .header("X-Unique-Upload-Id", upload_id)
            .multipart(form);
        if let Some(range) = content_range {
            request = request.header(reqwest::header::CONTENT_RANGE, range);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body).map_or_else(
                |_| {
                    let text = String::from_utf8_lossy(&body).trim().to_string();
                    if text.is_empty() {
                        status.to_string()
                    } else {
                        text
                    }
                },
                |envelope| envelope.error.message,
            );
            return Err(ProviderError::api(status.as_u16(), message));
        }

        Ok(body)
    }
}

/// `Content-Range` value for a chunk at `offset` of `len` bytes.
///
/// Empty files are sent without a range. A zero-length chunk of a non-empty
/// file means the file shrank after it was measured.
fn content_range(offset: u64, len: u64, total: u64) -> Result<Option<String>, ProviderError> {
    if total == 0 {
        return Ok(None);
    }
    let end = (offset + len).checked_sub(1).filter(|_| len > 0).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("upload ended at byte {offset} of {total}"),
        )
    })?;
    Ok(Some(format!("bytes {offset}-{end}/{total}")))
}

#[async_trait]
impl MediaProvider for CloudinaryProvider {
    async fn upload_large(
        &self,
        path: &Path,
        kind: ResourceKind,
    ) -> Result<ProviderUpload, ProviderError> {
        let mut file = File::open(path).await?;
        let total = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().into_owned());

        let url = self.upload_url(kind);
        let upload_id = Uuid::new_v4().simple().to_string();
        let fields = self.signed_fields(Utc::now().timestamp());

        info!(
            upload_id = %upload_id,
            resource_type = %kind,
            bytes = total,
            "Forwarding file to Cloudinary"
        );

        let mut offset = 0u64;
        loop {
            let mut chunk = Vec::new();
            (&mut file)
                .take(self.config.chunk_size)
                .read_to_end(&mut chunk)
                .await?;
            let len = chunk.len() as u64;
            let is_last = offset + len >= total;

            let range = content_range(offset, len, total)?;
            debug!(upload_id = %upload_id, range = ?range, "Sending chunk");
            let body = self
                .send_chunk(&url, &upload_id, &fields, &file_name, chunk, range)
                .await?;

            offset += len;
            if is_last || len == 0 {
                let result: ProviderUpload = serde_json::from_slice(&body)
                    .map_err(|e| ProviderError::invalid_response(e.to_string()))?;
                if result.secure_url.is_empty() {
                    return Err(ProviderError::invalid_response("empty secure_url"));
                }
                return Ok(result);
            }
        }
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_base: &str) -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "1234".to_string(),
            api_secret: "abcd".to_string(),
            api_base: api_base.to_string(),
            ..CloudinaryConfig::default()
        }
    }

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        std::io::Write::write_all(&mut file, contents).expect("write");
        file
    }

    #[test]
    fn test_new_requires_credentials() {
        let mut config = test_config("http://localhost");
        config.api_secret = String::new();
        assert!(matches!(
            CloudinaryProvider::new(config),
            Err(ProviderError::Configuration(_))
        ));

        let mut config = test_config("http://localhost");
        config.chunk_size = 0;
        assert!(matches!(
            CloudinaryProvider::new(config),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn test_upload_url() {
        let provider = CloudinaryProvider::new(test_config("https://api.cloudinary.com/")).unwrap();
        assert_eq!(
            provider.upload_url(ResourceKind::Video),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
        assert_eq!(
            provider.upload_url(ResourceKind::Auto),
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }

    #[test]
    fn test_sign_sorts_params_and_appends_secret() {
        let provider = CloudinaryProvider::new(test_config("http://localhost")).unwrap();
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());

        let expected = hex::encode(Sha1::digest(
            b"public_id=sample_image&timestamp=1315060510abcd",
        ));
        assert_eq!(provider.sign(&params), expected);

        let mut config = test_config("http://localhost");
        config.signature_algorithm = SignatureAlgorithm::Sha256;
        let provider = CloudinaryProvider::new(config).unwrap();
        let expected = hex::encode(Sha256::digest(
            b"public_id=sample_image&timestamp=1315060510abcd",
        ));
        assert_eq!(provider.sign(&params), expected);
    }

    #[test]
    fn test_content_range() {
        assert_eq!(
            content_range(0, 10, 10).unwrap().as_deref(),
            Some("bytes 0-9/10")
        );
        assert_eq!(
            content_range(4, 4, 10).unwrap().as_deref(),
            Some("bytes 4-7/10")
        );
        assert_eq!(content_range(0, 0, 0).unwrap(), None);
    }

    #[test]
    fn test_content_range_rejects_short_read() {
        let err = content_range(0, 0, 10).unwrap_err();
        assert!(matches!(err, ProviderError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));

        let err = content_range(8, 0, 10).unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
    }

    #[tokio::test]
    async fn test_single_chunk_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(header("Content-Range", "bytes 0-9/10"))
            .and(header_exists("X-Unique-Upload-Id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "abc",
                "resource_type": "image",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/abc.png",
                "bytes": 10
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = CloudinaryProvider::new(test_config(&server.uri())).unwrap();
        let file = write_temp(b"0123456789");

        let result = provider
            .upload_large(file.path(), ResourceKind::Image)
            .await
            .expect("upload should succeed");

        assert_eq!(
            result.secure_url,
            "https://res.cloudinary.com/demo/image/upload/abc.png"
        );
        assert_eq!(result.public_id.as_deref(), Some("abc"));
        assert_eq!(result.extra["bytes"], 10);
    }

    #[tokio::test]
    async fn test_multi_chunk_upload_sends_ranges() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Content-Range", "bytes 0-3/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": false })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("Content-Range", "bytes 4-7/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": false })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("Content-Range", "bytes 8-9/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "https://res.cloudinary.com/demo/raw/upload/file.bin"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        config.chunk_size = 4;
        let provider = CloudinaryProvider::new(config).unwrap();
        let file = write_temp(b"0123456789");

        let result = provider
            .upload_large(file.path(), ResourceKind::Auto)
            .await
            .expect("upload should succeed");
        assert!(result.secure_url.ends_with("file.bin"));
    }

    #[tokio::test]
    async fn test_api_error_message_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Invalid Signature abc" }
            })))
            .mount(&server)
            .await;

        let provider = CloudinaryProvider::new(test_config(&server.uri())).unwrap();
        let file = write_temp(b"hello");

        let err = provider
            .upload_large(file.path(), ResourceKind::Auto)
            .await
            .unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_result_without_secure_url_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "public_id": "x" })))
            .mount(&server)
            .await;

        let provider = CloudinaryProvider::new(test_config(&server.uri())).unwrap();
        let file = write_temp(b"hello");

        let err = provider
            .upload_large(file.path(), ResourceKind::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let provider = CloudinaryProvider::new(test_config("http://127.0.0.1:9")).unwrap();
        let err = provider
            .upload_large(Path::new("/nonexistent/upload.bin"), ResourceKind::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
    }
}
