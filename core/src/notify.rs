//! User-visible notifications emitted by mutations.
//!
//! The data-access layer only decides *what* to say; a [`Notifier`] decides
//! where it goes. [`TracingNotifier`] writes to the log, [`NotificationLog`]
//! keeps them in memory for a frontend to drain and display.

use std::time::Duration;

use parking_lot::Mutex;

/// How long success notifications stay on screen.
pub const SUCCESS_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    /// `None` keeps the notification until the user closes it.
    pub duration: Option<Duration>,
    pub closable: bool,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            description: description.into(),
            duration: Some(SUCCESS_DURATION),
            closable: true,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            description: description.into(),
            duration: None,
            closable: true,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sends notifications to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!(title = %notification.title, "{}", notification.description)
            }
            NotificationKind::Error => {
                tracing::error!(title = %notification.title, "{}", notification.description)
            }
        }
    }
}

/// Buffers notifications until [`drain`](Self::drain) is called.
#[derive(Debug, Default)]
pub struct NotificationLog {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.pending.lock().push(notification);
    }
}
