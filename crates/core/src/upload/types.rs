//! Upload types and data structures.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Hint telling the provider how to treat a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Image handling.
    Image,
    /// Video handling.
    Video,
    /// Let the provider detect the kind.
    #[default]
    Auto,
}

impl ResourceKind {
    /// Derive the kind from a declared MIME type.
    ///
    /// `video/*` maps to video, `image/*` to image, anything else to auto.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("video/") {
            Self::Video
        } else if content_type.starts_with("image/") {
            Self::Image
        } else {
            Self::Auto
        }
    }

    /// Wire name used in provider URLs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file that has been written to temp storage and awaits forwarding.
#[derive(Debug, Clone)]
pub struct BufferedUpload {
    /// Name the client gave the file.
    pub original_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Bytes written.
    pub size: u64,
    /// Temp file location.
    pub path: PathBuf,
}

impl BufferedUpload {
    /// Resource kind derived from the declared content type.
    #[must_use]
    pub fn resource_kind(&self) -> ResourceKind {
        ResourceKind::from_content_type(&self.content_type)
    }
}

/// Lifecycle of one upload request.
///
/// `Received → Buffered → Forwarding → {Completed | Failed}`. Failure is also
/// possible before forwarding (bad body, disk errors). Both end states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    /// Request accepted, body not yet consumed.
    Received,
    /// File fully written to temp storage.
    Buffered,
    /// Provider call in flight.
    Forwarding,
    /// Provider returned a result.
    Completed,
    /// Request ended with an error.
    Failed,
}

impl UploadPhase {
    /// Whether `next` may follow `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Buffered | Self::Failed)
                | (Self::Buffered, Self::Forwarding | Self::Failed)
                | (Self::Forwarding, Self::Completed | Self::Failed)
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Buffered => "buffered",
            Self::Forwarding => "forwarding",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
