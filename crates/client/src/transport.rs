//! Upload transport: the network half of the client.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::ClientError;
use crate::types::{FileSource, SelectedFile, UploadResult};

/// Bytes sent between progress reports.
pub const PIECE_SIZE: usize = 64 * 1024;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

type PieceStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Progress callback receiving `(loaded, total)` bytes.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Success body returned by the upload endpoint.
///
/// The server relays the provider payload; only the fields the client needs
/// are typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    /// Durable URL of the stored file.
    #[serde(default)]
    pub secure_url: Option<String>,
    /// Provider identifier.
    #[serde(default)]
    pub public_id: Option<String>,
    /// Provider resource type.
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Everything else the provider returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UploadResponse {
    /// Turn the response into a result list entry for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the response has no usable `secure_url`.
    pub fn into_result(self, name: &str) -> Result<UploadResult, ClientError> {
        let url = self
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                ClientError::MalformedResponse("response did not contain a secure_url".into())
            })?;

        Ok(UploadResult {
            name: name.to_string(),
            url,
            public_id: self.public_id,
            resource_type: self.resource_type,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Sends a selected file to the server.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Upload `file`, calling `progress` as bytes leave.
    async fn upload(
        &self,
        file: &SelectedFile,
        progress: ProgressFn,
    ) -> Result<UploadResponse, ClientError>;
}

/// `reqwest` transport posting to `{server}/api/upload`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for the server at `server` (scheme, host, port).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(server: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("mediarelay-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/upload", server.trim_end_matches('/')),
        })
    }

    /// Full upload URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Stream the file in fixed pieces.
async fn body_stream(source: &FileSource) -> Result<PieceStream, ClientError> {
    match source {
        FileSource::Path(path) => {
            let file = tokio::fs::File::open(path).await?;
            Ok(Box::pin(ReaderStream::with_capacity(file, PIECE_SIZE)))
        }
        FileSource::Bytes(bytes) => {
            let pieces: Vec<io::Result<Bytes>> = (0..bytes.len())
                .step_by(PIECE_SIZE)
                .map(|start| Ok(bytes.slice(start..bytes.len().min(start + PIECE_SIZE))))
                .collect();
            Ok(Box::pin(stream::iter(pieces)))
        }
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn upload(
        &self,
        file: &SelectedFile,
        progress: ProgressFn,
    ) -> Result<UploadResponse, ClientError> {
        let total = file.size;
        let mut loaded = 0u64;
        let body = body_stream(&file.source).await?.inspect_ok(move |piece| {
            loaded += piece.len() as u64;
            progress(loaded, total);
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part(FILE_FIELD, part);

        debug!(file = %file.name, bytes = total, endpoint = %self.endpoint, "Sending upload");
        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) if !error.is_empty() => ClientError::Server {
                    status: status.as_u16(),
                    message: error,
                },
                _ => ClientError::status(status.as_u16()),
            });
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}
