//! Background loops driving the heartbeat from inside a tokio runtime.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use super::{ConsumerHeartbeat, ConsumerHeartbeatCheck};

/// Tick `consumer_id` every `period` until `shutdown` flips to true.
///
/// The first tick happens immediately so a freshly started consumer is
/// visible before its first full period elapses.
pub fn spawn_heartbeat_ticker(
    heartbeat: Arc<dyn ConsumerHeartbeat>,
    consumer_id: String,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(consumer_id = %consumer_id, period_secs = period.as_secs(), "Heartbeat ticker started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = heartbeat.tick(&consumer_id).await {
                        error!(consumer_id = %consumer_id, error = %e, "Heartbeat tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!(consumer_id = %consumer_id, "Heartbeat ticker stopped");
    })
}

/// Run the heartbeat check every `period` until `shutdown` flips to true.
pub fn spawn_heartbeat_check(
    check: Arc<ConsumerHeartbeatCheck>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match check.run().await {
                        Ok(outcome) => debug!(outcome = ?outcome, "Heartbeat check completed"),
                        Err(e) => error!(error = %e, "Heartbeat check failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Heartbeat check loop stopped");
    })
}
