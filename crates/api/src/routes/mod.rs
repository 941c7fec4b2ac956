//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod upload;

/// Creates the router mounted under `/api`.
///
/// `body_limit` caps the whole upload request, multipart envelope included.
pub fn api_routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(upload::routes(body_limit))
}
