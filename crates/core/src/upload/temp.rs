//! Temp storage for files awaiting forwarding.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs::{self, File};
use tracing::warn;

/// Directory holding buffered uploads.
///
/// File names are the current time in milliseconds followed by the original
/// extension. There is no collision detection: two uploads landing in the
/// same millisecond with the same extension share a path.
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    /// Create a store rooted at `dir`. Nothing is touched until the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Temp file name for `original_name` at `now`.
    ///
    /// `photo.png` at 1718000000000ms becomes `1718000000000.png`; names
    /// without an extension get none.
    #[must_use]
    pub fn file_name_for(original_name: &str, now: DateTime<Utc>) -> String {
        let ext = Path::new(original_name)
            .extension()
            .map_or_else(String::new, |e| format!(".{}", e.to_string_lossy()));
        format!("{}{ext}", now.timestamp_millis())
    }

    /// Full temp path for `original_name` at `now`.
    #[must_use]
    pub fn path_for(&self, original_name: &str, now: DateTime<Utc>) -> PathBuf {
        self.dir.join(Self::file_name_for(original_name, now))
    }

    /// Create the directory if needed and open a fresh temp file.
    pub async fn create(&self, original_name: &str) -> io::Result<(PathBuf, File)> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(original_name, Utc::now());
        let file = File::create(&path).await?;
        Ok((path, file))
    }

    /// Remove a temp file. Failures are logged, never returned.
    pub async fn discard(path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
        }
    }
}
