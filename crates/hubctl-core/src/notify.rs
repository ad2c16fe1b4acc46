// ── User-facing notifications ──
//
// Every user action reports its outcome through a `Notifier`: failed
// actions emit exactly one `Error` notification, successful mutations
// one `Success`. How a notification is shown is the consumer's concern.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use strum::Display;
use tracing::{error, info};

/// Fallback description when an error carries no message.
pub const TRY_AGAIN: &str = "Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// One short message about the outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Success,
        }
    }

    /// An error notification whose description is `message`, or
    /// [`TRY_AGAIN`] when the message is blank.
    pub fn error(title: impl Into<String>, message: &str) -> Self {
        let description = if message.trim().is_empty() {
            TRY_AGAIN.to_owned()
        } else {
            message.to_owned()
        };
        Self {
            title: title.into(),
            description,
            severity: Severity::Error,
        }
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default notifier: emits each notification as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Success => info!(title = %n.title, "{}", n.description),
            Severity::Error => error!(title = %n.title, "{}", n.description),
        }
    }
}

/// Collects notifications in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_error_message_falls_back() {
        let n = Notification::error("Failed to load devices", "  ");
        assert_eq!(n.description, TRY_AGAIN);
        assert_eq!(n.severity, Severity::Error);
    }

    #[test]
    fn memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        let shared = notifier.clone();
        notifier.notify(Notification::success("a", "1"));
        notifier.notify(Notification::error("b", "2"));

        let titles: Vec<_> = shared.take().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, ["a", "b"]);
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn notification_serializes() {
        insta::assert_json_snapshot!(Notification::success("Logged out", "Bye"), @r###"
        {
          "title": "Logged out",
          "description": "Bye",
          "severity": "success"
        }
        "###);
    }
}
