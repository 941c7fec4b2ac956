//! Upload session state: selection, results, progress and notifications.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{info, warn};

use crate::MAX_FILE_SIZE;
use crate::error::ClientError;
use crate::notification::Notification;
use crate::transport::{ProgressFn, UploadTransport};
use crate::types::{SelectedFile, UploadResult};

#[derive(Debug, Default)]
struct SessionState {
    selected: Option<SelectedFile>,
    uploading: bool,
    progress: u8,
    results: Vec<UploadResult>,
    error: Option<String>,
    notification: Option<Notification>,
}

/// One user's upload workspace.
///
/// All state is owned here; at most one upload runs at a time.
#[derive(Clone)]
pub struct UploadSession {
    transport: Arc<dyn UploadTransport>,
    max_file_size: u64,
    state: Arc<Mutex<SessionState>>,
}

/// Percentage of `loaded` over `total`, rounded and capped at 100.
pub(crate) fn percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (u128::from(loaded) * 100 + u128::from(total) / 2) / u128::from(total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag even if the upload future is dropped.
struct InFlight(Arc<Mutex<SessionState>>);

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.0).uploading = false;
    }
}

impl UploadSession {
    /// Create a session using the standard 100 MiB ceiling.
    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        Self::with_max_file_size(transport, MAX_FILE_SIZE)
    }

    /// Create a session with a custom ceiling.
    pub fn with_max_file_size(transport: Arc<dyn UploadTransport>, max_file_size: u64) -> Self {
        Self {
            transport,
            max_file_size,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Select a file for the next upload.
    ///
    /// Files above the ceiling are rejected without any network traffic and
    /// the previous selection is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::FileTooLarge`] for oversized files.
    pub fn select_file(&self, file: SelectedFile) -> Result<(), ClientError> {
        let mut state = lock(&self.state);

        if file.size > self.max_file_size {
            let err = ClientError::FileTooLarge {
                size: file.size,
                max: self.max_file_size,
            };
            warn!(file = %file.name, size = file.size, "Rejected oversized file");
            state.selected = None;
            state.error = Some(err.to_string());
            state.notification = Some(Notification::error(err.to_string()));
            return Err(err);
        }

        state.selected = Some(file);
        state.error = None;
        Ok(())
    }

    /// Upload the selected file.
    ///
    /// Returns `Ok(None)` without doing anything when nothing is selected or
    /// an upload is already running.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error after recording it in the
    /// session.
    pub async fn upload(&self) -> Result<Option<UploadResult>, ClientError> {
        let file = {
            let mut state = lock(&self.state);
            let Some(file) = state.selected.clone() else {
                return Ok(None);
            };
            if state.uploading {
                return Ok(None);
            }
            state.uploading = true;
            state.progress = 0;
            state.error = None;
            file
        };
        let _in_flight = InFlight(Arc::clone(&self.state));

        let sink = Arc::clone(&self.state);
        let progress: ProgressFn = Arc::new(move |loaded, total| {
            let pct = percent(loaded, total);
            let mut state = lock(&sink);
            if pct > state.progress {
                state.progress = pct;
            }
        });

        info!(file = %file.name, bytes = file.size, "Uploading");
        let outcome = self
            .transport
            .upload(&file, progress)
            .await
            .and_then(|response| response.into_result(&file.name));

        let mut state = lock(&self.state);
        match outcome {
            Ok(result) => {
                info!(file = %result.name, url = %result.url, "Upload finished");
                state.progress = 100;
                state.selected = None;
                state.results.push(result.clone());
                state.notification = Some(Notification::success(format!(
                    "{} uploaded successfully!",
                    result.name
                )));
                Ok(Some(result))
            }
            Err(err) => {
                let message = format!("Upload failed: {err}");
                warn!(file = %file.name, error = %err, "Upload failed");
                state.progress = 0;
                state.error = Some(message.clone());
                state.notification = Some(Notification::error(message));
                Err(err)
            }
        }
    }

    /// Remove every result named `name`. Returns how many were removed.
    pub fn remove_result(&self, name: &str) -> usize {
        let mut state = lock(&self.state);
        let before = state.results.len();
        state.results.retain(|r| r.name != name);
        state.notification = Some(Notification::success(format!("{name} removed")));
        before - state.results.len()
    }

    /// URL of the first result named `name`.
    pub fn open_result(&self, name: &str) -> Option<String> {
        lock(&self.state)
            .results
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.url.clone())
    }

    /// Current progress percentage.
    pub fn progress(&self) -> u8 {
        lock(&self.state).progress
    }

    /// Completed uploads, oldest first.
    pub fn results(&self) -> Vec<UploadResult> {
        lock(&self.state).results.clone()
    }

    /// Currently selected file.
    pub fn selected(&self) -> Option<SelectedFile> {
        lock(&self.state).selected.clone()
    }

    /// Inline error text.
    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    /// Whether an upload is running.
    pub fn is_uploading(&self) -> bool {
        lock(&self.state).uploading
    }

    /// The visible notification, if it has not timed out.
    pub fn notification(&self) -> Option<Notification> {
        self.notification_at(Instant::now())
    }

    fn notification_at(&self, now: Instant) -> Option<Notification> {
        lock(&self.state)
            .notification
            .clone()
            .filter(|n| !n.is_expired_at(now))
    }
}
