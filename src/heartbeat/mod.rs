//! # Consumer Heartbeat
//!
//! Consumers tick a last-seen timestamp while they run. A periodic check asks
//! whether any consumer ticked within the update period and, when none did,
//! warns operators over a real-time notification channel.
//!
//! The alert is only sent when the broker itself is reachable: an unreachable
//! broker means the state is unknown, and silence is preferred over a
//! misleading "no consumers" warning.

pub mod check;
pub mod consumer;
pub mod postgres;
pub mod publisher;
pub mod runner;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;

pub use check::{ConsumerHeartbeatCheck, HeartbeatCheckOutcome};
pub use consumer::InMemoryConsumerHeartbeat;
pub use postgres::{PgConnectivityProbe, PgConsumerHeartbeat, PgNotifyPublisher};
pub use publisher::{BroadcastNotificationPublisher, Notification};
pub use runner::{spawn_heartbeat_check, spawn_heartbeat_ticker};

/// Answers whether any consumer is alive
#[async_trait]
pub trait ConsumerLivenessProbe: Send + Sync {
    async fn is_alive(&self) -> Result<bool>;
}

/// Consumer side of the heartbeat
#[async_trait]
pub trait ConsumerHeartbeat: ConsumerLivenessProbe {
    async fn tick(&self, consumer_id: &str) -> Result<()>;
}

/// Answers whether the message broker can be reached. Probe failures must be
/// reported as unreachable.
#[async_trait]
pub trait BrokerConnectivityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &JsonValue) -> Result<()>;
}
