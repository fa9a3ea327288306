//! Transient user-facing messages.
//!
//! Every notification is broadcast to subscribers and kept in a short
//! most-recent-first list for front ends that render a toast stack.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::lock;

pub const DEFAULT_MAX_VISIBLE: usize = 3;
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NotificationCenter {
    sender: broadcast::Sender<Notification>,
    visible: Mutex<VecDeque<Notification>>,
    max_visible: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VISIBLE)
    }
}

impl NotificationCenter {
    pub fn new(max_visible: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            visible: Mutex::new(VecDeque::with_capacity(max_visible)),
            max_visible: max_visible.max(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: OffsetDateTime::now_utc(),
        };

        match level {
            NotificationLevel::Error => {
                error!(id = %notification.id, message = %notification.message, "notification");
            }
            NotificationLevel::Warning => {
                warn!(id = %notification.id, message = %notification.message, "notification");
            }
            NotificationLevel::Success | NotificationLevel::Info => {
                info!(id = %notification.id, level = %level, message = %notification.message, "notification");
            }
        }

        {
            let mut visible = lock::lock(&self.visible, "notify");
            visible.push_front(notification.clone());
            visible.truncate(self.max_visible);
        }

        // No subscribers is fine; the visible list still records it.
        let _ = self.sender.send(notification.clone());
        notification
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Warning, message)
    }

    /// Newest first, at most `max_visible` entries.
    pub fn visible(&self) -> Vec<Notification> {
        lock::lock(&self.visible, "visible").iter().cloned().collect()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut visible = lock::lock(&self.visible, "dismiss");
        let before = visible.len();
        visible.retain(|n| n.id != id);
        visible.len() != before
    }

    pub fn clear(&self) {
        lock::lock(&self.visible, "clear").clear();
    }
}
