//! Upload relay: buffer an incoming file, forward it, clean up.
//!
//! This module provides the request-independent half of `POST /api/upload`:
//! - Resource kind derivation from the declared content type
//! - Temp-file naming and buffering with a size ceiling
//! - Forwarding to the configured provider with guaranteed temp cleanup

mod error;
mod service;
mod temp;
mod types;

pub use error::UploadError;
pub use service::UploadService;
pub use temp::TempStore;
pub use types::{BufferedUpload, ResourceKind, UploadPhase};
