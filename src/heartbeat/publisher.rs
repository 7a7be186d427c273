use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tracing::debug;

use super::NotificationPublisher;
use crate::error::Result;

/// A message published on a real-time channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub channel: String,
    pub payload: JsonValue,
}

/// Fans notifications out to in-process subscribers, e.g. a websocket bridge.
/// Publishing without subscribers is not an error.
#[derive(Debug, Clone)]
pub struct BroadcastNotificationPublisher {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotificationPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl NotificationPublisher for BroadcastNotificationPublisher {
    async fn publish(&self, channel: &str, payload: &JsonValue) -> Result<()> {
        let receivers = self
            .sender
            .send(Notification {
                channel: channel.to_string(),
                payload: payload.clone(),
            })
            .unwrap_or(0);
        debug!(channel = %channel, receivers, "Published notification");
        Ok(())
    }
}
