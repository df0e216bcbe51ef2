//! Notifications produced by store mutations and the sinks that receive them.
//!
//! Stores never talk to a sink directly. Each mutation returns the notifications it
//! would send, and the [`Dispatcher`] hands them to whatever sink is plugged in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::fields::{EntityType, NotificationKind};

/// The record a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub recipient_id: String,
    pub related_entity: Option<RelatedEntity>,
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        recipient_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Notification {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            recipient_id: recipient_id.into(),
            related_entity: None,
            action_url: None,
            created_at: now,
            read: false,
        }
    }

    /// Point the notification at a record; tasks and goals also get a link.
    pub fn about(mut self, kind: EntityType, id: impl ToString, name: impl Into<String>) -> Self {
        let id = id.to_string();
        self.action_url = match kind {
            EntityType::Task => Some(format!("/tasks/{id}")),
            EntityType::Goal => Some(format!("/goals/{id}")),
            _ => None,
        };
        self.related_entity = Some(RelatedEntity { kind, id, name: name.into() });
        self
    }
}

/// Receiver of notifications. Fire-and-forget: nothing is returned to the producer.
pub trait NotificationSink {
    fn emit(&mut self, notification: Notification);
}

/// Collects everything it receives. Used by tests and previews.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub received: Vec<Notification>,
}

impl MemorySink {
    pub fn for_recipient(&self, recipient_id: &str) -> Vec<&Notification> {
        self.received.iter().filter(|n| n.recipient_id == recipient_id).collect()
    }

    pub fn clear(&mut self) {
        self.received.clear();
    }
}

impl NotificationSink for MemorySink {
    fn emit(&mut self, notification: Notification) {
        self.received.push(notification);
    }
}

/// Logs every notification and keeps it in an inbox that is persisted with the database.
#[derive(Debug, Default)]
pub struct LogSink {
    pub inbox: Vec<Notification>,
}

impl LogSink {
    pub fn new(inbox: Vec<Notification>) -> Self {
        LogSink { inbox }
    }
}

impl NotificationSink for LogSink {
    fn emit(&mut self, notification: Notification) {
        info!(
            recipient = %notification.recipient_id,
            kind = ?notification.kind,
            title = %notification.title,
            "{}",
            notification.message
        );
        self.inbox.push(notification);
    }
}

/// Applies the notification lists returned by store mutations to a sink.
pub struct Dispatcher;

impl Dispatcher {
    /// Emit every notification in order and return how many were sent.
    pub fn dispatch(sink: &mut dyn NotificationSink, notifications: Vec<Notification>) -> usize {
        let count = notifications.len();
        for n in notifications {
            sink.emit(n);
        }
        count
    }
}
