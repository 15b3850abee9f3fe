use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{error, warn};

use crate::api::error::ErrorKind;

pub const NOTIFICATION_DURATION: Duration = Duration::from_millis(5_000);

pub const CREDENTIAL_EXCHANGE_FAILED: &str =
    "Failed to exchange credentials. You may try to login again.";
pub const LOGIN_REQUIRED: &str = "Being logged in is required for this action.";
pub const BACKGROUND_REQUEST_FAILED: &str = "A request failed in the background.";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => f.write_str("error"),
            Level::Warning => f.write_str("warning"),
        }
    }
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub message: &'static str,
    pub duration: Duration,
    pub kind: ErrorKind,
}

impl Notification {
    pub fn credential_exchange_failed() -> Self {
        Self {
            level: Level::Error,
            message: CREDENTIAL_EXCHANGE_FAILED,
            duration: NOTIFICATION_DURATION,
            kind: ErrorKind::CredExchange,
        }
    }

    pub fn login_required() -> Self {
        Self {
            level: Level::Error,
            message: LOGIN_REQUIRED,
            duration: NOTIFICATION_DURATION,
            kind: ErrorKind::Unauthorized,
        }
    }

    pub fn background_request_failed(kind: ErrorKind) -> Self {
        Self {
            level: Level::Warning,
            message: BACKGROUND_REQUEST_FAILED,
            duration: NOTIFICATION_DURATION,
            kind,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn show(&self, notification: Notification);
}

/// Prints notifications to stderr. A terminal has no expiry, so the
/// duration is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show(&self, notification: Notification) {
        eprintln!("{}: {}", notification.level, notification.message);
    }
}

/// Emits notifications as log events through the installed subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, notification: Notification) {
        let kind = notification.kind;
        let duration_ms = u64::try_from(notification.duration.as_millis()).unwrap_or(u64::MAX);
        match notification.level {
            Level::Error => error!(kind = %kind, duration_ms, "{}", notification.message),
            Level::Warning => warn!(kind = %kind, duration_ms, "{}", notification.message),
        }
    }
}

/// Keeps every notification it is shown.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.notifications()
            .into_iter()
            .map(|notification| notification.kind)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notification: Notification) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
