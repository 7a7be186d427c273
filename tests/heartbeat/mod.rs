//! Consumer heartbeat check scenarios.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use jobflow_core::config::HeartbeatConfig;
use jobflow_core::heartbeat::{ConsumerHeartbeat, ConsumerHeartbeatCheck, HeartbeatCheckOutcome, InMemoryConsumerHeartbeat};

use crate::common::{FixedConnectivity, FixedLiveness, RecordingPublisher};

const CHANNEL: &str = "jobflow_message_queue_heartbeat";

#[tokio::test]
async fn dead_consumers_with_reachable_broker_send_one_notification() {
    let liveness = FixedLiveness::new(false);
    let connectivity = FixedConnectivity::new(true);
    let publisher = RecordingPublisher::new();
    let check = ConsumerHeartbeatCheck::new(
        15,
        CHANNEL,
        liveness.clone(),
        connectivity.clone(),
        publisher.clone(),
    );

    let outcome = check.run().await.unwrap();

    assert_eq!(outcome, HeartbeatCheckOutcome::NotificationSent);
    assert_eq!(publisher.published(), vec![(CHANNEL.to_string(), json!({}))]);
    assert_eq!(liveness.calls(), 1);
    assert_eq!(connectivity.calls(), 1);
}

#[tokio::test]
async fn unreachable_broker_suppresses_notification() {
    let publisher = RecordingPublisher::new();
    let check = ConsumerHeartbeatCheck::new(
        15,
        CHANNEL,
        FixedLiveness::new(false),
        FixedConnectivity::new(false),
        publisher.clone(),
    );

    let outcome = check.run().await.unwrap();

    assert_eq!(outcome, HeartbeatCheckOutcome::BrokerUnreachable);
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn live_consumers_never_notify() {
    for reachable in [true, false] {
        let connectivity = FixedConnectivity::new(reachable);
        let publisher = RecordingPublisher::new();
        let check = ConsumerHeartbeatCheck::new(
            15,
            CHANNEL,
            FixedLiveness::new(true),
            connectivity.clone(),
            publisher.clone(),
        );

        assert_eq!(
            check.run().await.unwrap(),
            HeartbeatCheckOutcome::ConsumersAlive
        );
        assert!(publisher.published().is_empty());
        assert_eq!(connectivity.calls(), 0);
    }
}

#[tokio::test]
async fn zero_period_touches_no_probe() {
    let liveness = FixedLiveness::new(false);
    let connectivity = FixedConnectivity::new(true);
    let publisher = RecordingPublisher::new();
    let config = HeartbeatConfig {
        update_period_minutes: 0,
        ..HeartbeatConfig::default()
    };
    let check = ConsumerHeartbeatCheck::from_config(
        &config,
        liveness.clone(),
        connectivity.clone(),
        publisher.clone(),
    );

    assert_eq!(check.run().await.unwrap(), HeartbeatCheckOutcome::Disabled);
    assert_eq!(liveness.calls(), 0);
    assert_eq!(connectivity.calls(), 0);
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn ticking_consumer_keeps_check_quiet() {
    let heartbeat = Arc::new(InMemoryConsumerHeartbeat::new(Duration::from_secs(15 * 60)).unwrap());
    let publisher = RecordingPublisher::new();
    let check = ConsumerHeartbeatCheck::from_config(
        &HeartbeatConfig::default(),
        heartbeat.clone(),
        FixedConnectivity::new(true),
        publisher.clone(),
    );

    assert_eq!(check.run().await.unwrap(), HeartbeatCheckOutcome::NotificationSent);

    heartbeat.tick("consumer-1").await.unwrap();
    assert_eq!(check.run().await.unwrap(), HeartbeatCheckOutcome::ConsumersAlive);
    assert_eq!(publisher.published().len(), 1);
}
