//! Root job roll-up through the resolver, for both child representations.

use std::sync::Arc;

use jobflow_core::calculator::{RootJobStatusUpdater, StatusCalculatorResolver};
use jobflow_core::models::{AggregateStatus, NewJob};
use jobflow_core::store::{
    find_root_with_materialized_view, find_root_with_query_view, JobStore, MemoryJobStore,
};
use jobflow_core::{JobStatus, JobflowError};

/// Root job with one child per `(status, progress)` pair, written straight to
/// the store.
async fn seed(children: &[(JobStatus, Option<f64>)]) -> (Arc<dyn JobStore>, i64) {
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let root = store.create_root_job(NewJob::named("import")).await.unwrap();
    for (i, (status, progress)) in children.iter().enumerate() {
        let mut child = store
            .create_child_job(root.id, NewJob::named(format!("import:{i}")))
            .await
            .unwrap();
        child.status = *status;
        child.progress = *progress;
        store.update_job(&child).await.unwrap();
    }
    (store, root.id)
}

async fn both_views(children: &[(JobStatus, Option<f64>)]) -> (AggregateStatus, AggregateStatus) {
    let (store, root_id) = seed(children).await;
    let resolver = StatusCalculatorResolver::new();

    let materialized = find_root_with_materialized_view(store.as_ref(), root_id)
        .await
        .unwrap();
    let query = find_root_with_query_view(&store, root_id).await.unwrap();

    (
        resolver.calculate(&materialized).await.unwrap(),
        resolver.calculate(&query).await.unwrap(),
    )
}

#[tokio::test]
async fn running_child_keeps_root_running() {
    let (materialized, query) = both_views(&[
        (JobStatus::Success, None),
        (JobStatus::Running, Some(0.5)),
        (JobStatus::New, None),
    ])
    .await;

    assert_eq!(materialized, query);
    assert_eq!(materialized.status, JobStatus::Running);
    assert_eq!(materialized.progress, Some(0.5));
}

#[tokio::test]
async fn failed_child_fails_root() {
    let (materialized, query) = both_views(&[
        (JobStatus::Failed, Some(0.2)),
        (JobStatus::Running, Some(0.9)),
        (JobStatus::Success, Some(1.0)),
    ])
    .await;

    assert_eq!(materialized, query);
    assert_eq!(materialized.status, JobStatus::Failed);
    assert_eq!(materialized.progress, Some(0.7));
}

#[tokio::test]
async fn all_successful_children_complete_root() {
    let (materialized, query) =
        both_views(&[(JobStatus::Success, None), (JobStatus::Success, Some(1.0))]).await;

    assert_eq!(materialized, query);
    assert_eq!(
        materialized,
        AggregateStatus {
            status: JobStatus::Success,
            progress: Some(1.0)
        }
    );
}

#[tokio::test]
async fn cancelled_wins_over_success_once_all_finished() {
    let (materialized, query) =
        both_views(&[(JobStatus::Cancelled, None), (JobStatus::Success, None)]).await;

    assert_eq!(materialized, query);
    assert_eq!(materialized.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn root_without_children_stays_new() {
    let (materialized, query) = both_views(&[]).await;

    assert_eq!(materialized, query);
    assert_eq!(materialized.status, JobStatus::New);
    assert_eq!(materialized.progress, None);
}

#[tokio::test]
async fn progress_is_rounded_to_four_decimals() {
    let (materialized, _) = both_views(&[
        (JobStatus::Running, Some(1.0 / 3.0)),
        (JobStatus::Running, Some(0.0)),
        (JobStatus::Running, Some(0.0)),
    ])
    .await;

    assert_eq!(materialized.progress, Some(0.1111));
}

#[tokio::test]
async fn root_without_child_view_is_rejected() {
    let (store, root_id) = seed(&[(JobStatus::Running, None)]).await;
    let root = store.find_job(root_id).await.unwrap().unwrap();
    assert!(root.child_jobs.is_none());

    let error = StatusCalculatorResolver::new()
        .calculator_for_root_job(&root)
        .map(|calculator| calculator.name())
        .unwrap_err();

    assert_eq!(
        error,
        JobflowError::UnsupportedCollectionType {
            type_name: "null".to_string()
        }
    );
    assert!(error.to_string().contains("null"));
}

#[tokio::test]
async fn updater_rolls_child_reports_into_root() {
    let (store, root_id) = seed(&[(JobStatus::New, None), (JobStatus::New, None)]).await;
    let children = store.list_child_jobs(root_id).await.unwrap();
    let updater = RootJobStatusUpdater::new(Arc::clone(&store));

    let update = updater
        .apply_child_status(children[0].id, JobStatus::Running, Some(0.5))
        .await
        .unwrap();
    assert!(update.changed());
    assert_eq!(update.current.status, JobStatus::Running);
    assert_eq!(update.current.progress, Some(0.25));

    updater
        .apply_child_status(children[0].id, JobStatus::Success, Some(1.0))
        .await
        .unwrap();
    let update = updater
        .apply_child_status(children[1].id, JobStatus::Running, None)
        .await
        .unwrap();
    assert_eq!(update.current.progress, Some(0.5));

    let update = updater
        .apply_child_status(children[1].id, JobStatus::Failed, Some(0.4))
        .await
        .unwrap();
    assert_eq!(update.current.status, JobStatus::Failed);
    assert_eq!(update.current.progress, Some(0.7));

    let root = store.find_job(root_id).await.unwrap().unwrap();
    assert_eq!(root.status, JobStatus::Failed);
    assert_eq!(root.progress, Some(0.7));
    assert!(root.stopped_at.is_some());
}

#[tokio::test]
async fn updater_rejects_invalid_child_transition() {
    let (store, root_id) = seed(&[(JobStatus::Success, None)]).await;
    let child = store.list_child_jobs(root_id).await.unwrap().remove(0);

    let error = RootJobStatusUpdater::new(store)
        .apply_child_status(child.id, JobStatus::Running, None)
        .await
        .unwrap_err();

    assert!(matches!(error, JobflowError::InvalidStatusTransition { .. }));
}
