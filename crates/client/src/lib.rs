//! Upload client for mediarelay.
//!
//! This crate provides:
//! - [`UploadSession`]: selection, result list, progress and notifications
//! - [`UploadTransport`]: the seam between session logic and the network
//! - [`HttpTransport`]: multipart upload over `reqwest` with progress

pub mod error;
pub mod notification;
pub mod session;
pub mod transport;
pub mod types;

pub use error::ClientError;
pub use notification::{NOTIFICATION_TTL, Notification, NotificationKind};
pub use session::UploadSession;
pub use transport::{HttpTransport, ProgressFn, UploadResponse, UploadTransport};
pub use types::{FileSource, SelectedFile, UploadResult};

/// Largest file the client will send, matching the server ceiling.
pub const MAX_FILE_SIZE: u64 = mediarelay_shared::config::DEFAULT_MAX_FILE_SIZE;
