//! Notification sink: surfaces validation and submission outcomes to the user.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// How prominent a notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A toast-style message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// Side-effect sink for user-facing notifications. Nothing it does is
/// reported back to the wizard.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, severity: Severity);
}

/// Prints notifications to stderr for the terminal REPL.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        let icon = match severity {
            Severity::Info => "ℹ️ ",
            Severity::Success => "✅",
            Severity::Warning => "⚠️ ",
            Severity::Error => "❌",
        };
        eprintln!("{icon} {title}: {message}");
    }
}

/// Buffers notifications until drained. Used by the HTTP surface to return
/// them with the response, and by tests.
#[derive(Default)]
pub struct CollectingNotifier {
    inner: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything collected so far.
    pub fn drain(&self) -> Vec<Notification> {
        match self.inner.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        tracing::debug!(title, message, %severity, "Notification queued");
        let note = Notification {
            title: title.to_string(),
            message: message.to_string(),
            severity,
        };
        match self.inner.lock() {
            Ok(mut guard) => guard.push(note),
            Err(poisoned) => poisoned.into_inner().push(note),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_notifier_drains_in_order() {
        let notifier = CollectingNotifier::new();
        notifier.notify("Invalid choice", "Pick one of the options", Severity::Error);
        notifier.notify("Sent", "We'll be in touch", Severity::Success);

        assert_eq!(notifier.snapshot().len(), 2);
        let drained = notifier.drain();
        assert_eq!(drained[0].severity, Severity::Error);
        assert_eq!(drained[1].title, "Sent");
        assert!(notifier.drain().is_empty());
    }

    #[test]
    fn severity_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
        assert_eq!(Severity::Success.to_string(), "success");
    }
}
