use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{BrokerConnectivityProbe, ConsumerLivenessProbe, NotificationPublisher};
use crate::config::HeartbeatConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatCheckOutcome {
    /// Update period is zero; nothing was probed
    Disabled,
    ConsumersAlive,
    /// No live consumer, but the broker is unreachable so no alert was sent
    BrokerUnreachable,
    NotificationSent,
}

impl HeartbeatCheckOutcome {
    pub fn notified(&self) -> bool {
        matches!(self, Self::NotificationSent)
    }
}

/// Periodic check that warns operators when no consumer is running
pub struct ConsumerHeartbeatCheck {
    update_period_minutes: u64,
    channel: String,
    liveness: Arc<dyn ConsumerLivenessProbe>,
    connectivity: Arc<dyn BrokerConnectivityProbe>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl ConsumerHeartbeatCheck {
    pub fn new(
        update_period_minutes: u64,
        channel: impl Into<String>,
        liveness: Arc<dyn ConsumerLivenessProbe>,
        connectivity: Arc<dyn BrokerConnectivityProbe>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            update_period_minutes,
            channel: channel.into(),
            liveness,
            connectivity,
            publisher,
        }
    }

    pub fn from_config(
        config: &HeartbeatConfig,
        liveness: Arc<dyn ConsumerLivenessProbe>,
        connectivity: Arc<dyn BrokerConnectivityProbe>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self::new(
            config.update_period_minutes,
            config.notification_channel.clone(),
            liveness,
            connectivity,
            publisher,
        )
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Run one check.
    ///
    /// The connectivity probe is consulted only when no consumer is alive,
    /// and at most one notification is published per run.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub async fn run(&self) -> Result<HeartbeatCheckOutcome> {
        if self.update_period_minutes == 0 {
            debug!("Consumer heartbeat check disabled");
            return Ok(HeartbeatCheckOutcome::Disabled);
        }

        if self.liveness.is_alive().await? {
            debug!("At least one consumer is alive");
            return Ok(HeartbeatCheckOutcome::ConsumersAlive);
        }

        if !self.connectivity.is_reachable().await {
            warn!("No live consumers detected but the broker is unreachable; alert suppressed");
            return Ok(HeartbeatCheckOutcome::BrokerUnreachable);
        }

        self.publisher.publish(&self.channel, &json!({})).await?;
        info!(
            update_period_minutes = self.update_period_minutes,
            "No live consumers detected; notification sent"
        );
        Ok(HeartbeatCheckOutcome::NotificationSent)
    }
}
