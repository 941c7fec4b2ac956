//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - `POST /api/upload` and `GET /api/health`
//! - Static single-page application serving for every other route
//! - CORS, request tracing and the upload body limit

pub mod error;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use mediarelay_core::upload::UploadService;
use mediarelay_shared::{AppConfig, ProviderKind};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use error::ApiError;

/// Request bytes allowed on top of the file ceiling for the multipart envelope.
pub const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload relay service.
    pub uploads: Arc<UploadService>,
}

/// Router settings that do not belong to handler state.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Origins allowed to call the API cross-origin.
    pub allowed_origins: Vec<String>,
    /// Built single-page application.
    pub static_dir: PathBuf,
    /// Directory served under `/media` (local provider only).
    pub media_dir: Option<PathBuf>,
}

impl RouterOptions {
    /// Derive router settings from application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let media_dir = (config.provider.kind == ProviderKind::LocalFs)
            .then(|| config.provider.local_fs.root.clone());

        Self {
            allowed_origins: config.server.allowed_origins.clone(),
            static_dir: config.server.static_dir.clone(),
            media_dir,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, options: &RouterOptions) -> Router {
    let body_limit = usize::try_from(
        state
            .uploads
            .max_file_size()
            .saturating_add(MULTIPART_OVERHEAD),
    )
    .unwrap_or(usize::MAX);

    let mut router = Router::new().nest("/api", routes::api_routes(body_limit));
    if let Some(media_dir) = &options.media_dir {
        router = router.nest_service("/media", ServeDir::new(media_dir));
    }

    let index = options.static_dir.join("index.html");
    router
        .fallback_service(ServeDir::new(&options.static_dir).fallback(ServeFile::new(index)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&options.allowed_origins))
        .with_state(state)
}

/// CORS policy for the configured origins.
///
/// Requests without an `Origin` header are not affected.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
