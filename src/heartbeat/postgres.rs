//! PostgreSQL-backed heartbeat storage, connectivity probe and NOTIFY publisher.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{BrokerConnectivityProbe, ConsumerHeartbeat, ConsumerLivenessProbe, NotificationPublisher};
use crate::constants::system::MAX_NOTIFY_PAYLOAD_BYTES;
use crate::error::{JobflowError, Result};

/// Heartbeats stored in `jobflow_consumer_heartbeats`, one row per consumer
#[derive(Clone)]
pub struct PgConsumerHeartbeat {
    pool: PgPool,
    update_period: Duration,
}

impl PgConsumerHeartbeat {
    pub fn new(pool: PgPool, update_period: Duration) -> Self {
        Self {
            pool,
            update_period,
        }
    }
}

#[async_trait]
impl ConsumerLivenessProbe for PgConsumerHeartbeat {
    async fn is_alive(&self) -> Result<bool> {
        let alive: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM jobflow_consumer_heartbeats
                WHERE last_seen_at > NOW() - make_interval(secs => $1)
            )
            "#,
        )
        .bind(self.update_period.as_secs_f64())
        .fetch_one(&self.pool)
        .await?;
        Ok(alive)
    }
}

#[async_trait]
impl ConsumerHeartbeat for PgConsumerHeartbeat {
    async fn tick(&self, consumer_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobflow_consumer_heartbeats (consumer_id, last_seen_at)
            VALUES ($1, NOW())
            ON CONFLICT (consumer_id) DO UPDATE SET last_seen_at = EXCLUDED.last_seen_at
            "#,
        )
        .bind(consumer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Treats the database as the broker: reachable when `SELECT 1` succeeds
#[derive(Clone)]
pub struct PgConnectivityProbe {
    pool: PgPool,
}

impl PgConnectivityProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BrokerConnectivityProbe for PgConnectivityProbe {
    async fn is_reachable(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Broker connectivity probe failed");
                false
            }
        }
    }
}

/// Publishes through `pg_notify`
#[derive(Clone)]
pub struct PgNotifyPublisher {
    pool: PgPool,
}

impl PgNotifyPublisher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationPublisher for PgNotifyPublisher {
    #[instrument(skip(self, payload), fields(channel = %channel))]
    async fn publish(&self, channel: &str, payload: &JsonValue) -> Result<()> {
        let payload = serde_json::to_string(payload)?;
        if payload.len() > MAX_NOTIFY_PAYLOAD_BYTES {
            return Err(JobflowError::Notification(format!(
                "Payload size {} exceeds limit {}",
                payload.len(),
                MAX_NOTIFY_PAYLOAD_BYTES
            )));
        }

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(channel)
            .bind(&payload)
            .execute(&self.pool)
            .await
            .map_err(|e| JobflowError::Notification(e.to_string()))?;

        debug!("Sent notification");
        Ok(())
    }
}
