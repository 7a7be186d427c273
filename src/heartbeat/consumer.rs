use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tracing::trace;

use super::{ConsumerHeartbeat, ConsumerLivenessProbe};
use crate::error::{JobflowError, Result};

/// Last-seen timestamps held in process memory
#[derive(Debug)]
pub struct InMemoryConsumerHeartbeat {
    update_period: ChronoDuration,
    last_seen: DashMap<String, DateTime<Utc>>,
}

impl InMemoryConsumerHeartbeat {
    pub fn new(update_period: Duration) -> Result<Self> {
        let update_period = ChronoDuration::from_std(update_period)
            .map_err(|e| JobflowError::Configuration(format!("Invalid heartbeat period: {e}")))?;
        Ok(Self {
            update_period,
            last_seen: DashMap::new(),
        })
    }

    pub fn tick_at(&self, consumer_id: &str, at: DateTime<Utc>) {
        self.last_seen.insert(consumer_id.to_string(), at);
    }

    /// Whether any consumer ticked within the period before `now`
    pub fn is_alive_at(&self, now: DateTime<Utc>) -> bool {
        let threshold = now - self.update_period;
        self.last_seen.iter().any(|entry| *entry.value() > threshold)
    }
}

#[async_trait]
impl ConsumerLivenessProbe for InMemoryConsumerHeartbeat {
    async fn is_alive(&self) -> Result<bool> {
        Ok(self.is_alive_at(Utc::now()))
    }
}

#[async_trait]
impl ConsumerHeartbeat for InMemoryConsumerHeartbeat {
    async fn tick(&self, consumer_id: &str) -> Result<()> {
        trace!(consumer_id = %consumer_id, "Consumer heartbeat tick");
        self.tick_at(consumer_id, Utc::now());
        Ok(())
    }
}
