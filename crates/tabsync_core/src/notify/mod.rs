//! User-facing status notifications.
//!
//! Fire-and-forget: the coordinator never inspects what a notifier does.

use log::{error, info, warn};
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotifyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for NotifyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation hook for transient status messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str, duration: Duration);
}

/// Notifier that writes every message to the process log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, duration: Duration) {
        let duration_ms = duration.as_millis();
        match level {
            NotifyLevel::Info | NotifyLevel::Success => info!(
                "event=notify module=notify level={level} duration_ms={duration_ms} message={message:?}"
            ),
            NotifyLevel::Warning => warn!(
                "event=notify module=notify level={level} duration_ms={duration_ms} message={message:?}"
            ),
            NotifyLevel::Error => error!(
                "event=notify module=notify level={level} duration_ms={duration_ms} message={message:?}"
            ),
        }
    }
}
