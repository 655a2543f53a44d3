//! Page-level transient notifications.
//!
//! Every widget on a page shares one append-only sink. Each entry starts
//! closing once its own timeout has elapsed; entries never affect one
//! another.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Timeout used when an alert does not specify one.
pub const DEFAULT_ALERT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Classification of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Success,
    Warning,
    Error,
    #[default]
    Message,
    Loading,
}

impl AlertKind {
    /// Parses a widget-supplied type name; unknown names are plain messages.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "loading" => Self::Loading,
            _ => Self::Message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    Shown,
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub text: String,
    pub kind: AlertKind,
    pub timeout: Duration,
    pub issued_at: Instant,
}

impl Notification {
    pub fn closes_at(&self) -> Instant {
        self.issued_at + self.timeout
    }

    pub fn phase_at(&self, now: Instant) -> NotificationPhase {
        if now >= self.closes_at() {
            NotificationPhase::Closing
        } else {
            NotificationPhase::Shown
        }
    }

    pub fn phase(&self) -> NotificationPhase {
        self.phase_at(Instant::now())
    }
}

#[derive(Debug, Default)]
pub struct NotificationSink {
    entries: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
}

impl NotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a notification and returns its id.
    pub fn push(&self, text: impl Into<String>, kind: AlertKind, timeout: Option<Duration>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entry = Notification {
            id,
            text: text.into(),
            kind,
            timeout: timeout.unwrap_or(DEFAULT_ALERT_TIMEOUT),
            issued_at: Instant::now(),
        };
        debug!(id, kind = ?entry.kind, timeout_ms = entry.timeout.as_millis() as u64, "Notification issued");

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        id
    }

    pub fn warn(&self, text: impl Into<String>) -> u64 {
        self.push(text, AlertKind::Warning, None)
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: u64) -> Option<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries still shown at `now`.
    pub fn visible_at(&self, now: Instant) -> Vec<Notification> {
        self.entries()
            .into_iter()
            .filter(|n| n.phase_at(now) == NotificationPhase::Shown)
            .collect()
    }
}
