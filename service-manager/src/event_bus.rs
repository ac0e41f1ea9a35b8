//! # Event Bus
//!
//! Every registry change and every lifecycle transition of the manager is announced as a
//! [`Notification`] through a [`NotificationSink`]. The in-process [`EventBus`] fans
//! notifications out to any number of subscribers (monitoring, logging, tests).
//!
//! Sinks may fail; the manager logs such failures and carries on.

use anyhow::Result;
use chrono::{DateTime, Utc};
use edgeflow_api::ServiceState;
use tokio::sync::broadcast;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Artifact,
    Service,
    Server,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Added {
        id: String,
    },
    Removed {
        id: String,
    },
    StateChanged {
        id: String,
        from: ServiceState,
        to: ServiceState,
    },
}

impl Mutation {
    pub fn id(&self) -> &str {
        match self {
            Mutation::Added { id } | Mutation::Removed { id } => id,
            Mutation::StateChanged { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub topic: Topic,
    pub mutation: Mutation,
    pub timestamp: DateTime<Utc>,
}

/// Receiver of change notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, topic: Topic, mutation: Mutation) -> Result<()>;
}

/// A tokio broadcast channel carrying [`Notification`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` notifications per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, notification: Notification) {
        // No subscribers is fine.
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for EventBus {
    fn notify(&self, topic: Topic, mutation: Mutation) -> Result<()> {
        self.publish(Notification {
            topic,
            mutation,
            timestamp: Utc::now(),
        });
        Ok(())
    }
}
