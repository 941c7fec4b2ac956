//! Transient user notifications.

use std::time::{Duration, Instant};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Something completed.
    Success,
    /// Something failed.
    Error,
}

/// A single toast-style message.
///
/// Only one is shown at a time; a newer one replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text shown to the user.
    pub message: String,
    /// Severity.
    pub kind: NotificationKind,
    /// When it was shown.
    pub shown_at: Instant,
}

impl Notification {
    /// Success notification shown now.
    pub fn success(message: impl Into<String>) -> Self {
        Self::shown_at(NotificationKind::Success, message, Instant::now())
    }

    /// Error notification shown now.
    pub fn error(message: impl Into<String>) -> Self {
        Self::shown_at(NotificationKind::Error, message, Instant::now())
    }

    pub(crate) fn shown_at(kind: NotificationKind, message: impl Into<String>, at: Instant) -> Self {
        Self {
            message: message.into(),
            kind,
            shown_at: at,
        }
    }

    /// Whether the notification has timed out at `now`.
    ///
    /// Expiry is measured from this notification's own display time, so a
    /// replacement always gets the full window.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= NOTIFICATION_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_after_ttl() {
        let start = Instant::now();
        let n = Notification::shown_at(NotificationKind::Success, "a.txt removed", start);

        assert!(!n.is_expired_at(start));
        assert!(!n.is_expired_at(start + Duration::from_millis(2999)));
        assert!(n.is_expired_at(start + NOTIFICATION_TTL));
    }

    #[test]
    fn test_replacement_gets_full_window() {
        let start = Instant::now();
        let first = Notification::shown_at(NotificationKind::Success, "first", start);
        let second = Notification::shown_at(
            NotificationKind::Error,
            "second",
            start + Duration::from_secs(2),
        );

        let later = start + Duration::from_millis(3500);
        assert!(first.is_expired_at(later));
        assert!(!second.is_expired_at(later));
    }
}
