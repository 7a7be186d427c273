//! Rebuilding trigger schedules from a configuration snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use jobflow_core::config::TriggersConfig;
use jobflow_core::constants::commands::{HANDLE_TRIGGER, HANDLE_TRIGGER_PROGRAM};
use jobflow_core::models::TriggerDefinition;
use jobflow_core::scheduler::{
    render_crontab, CronScheduler, InMemoryCronScheduler, TriggerScheduleRegistrar,
};
use jobflow_core::triggers::{MemoryTriggerRepository, TriggerRepository};

fn snapshot() -> TriggersConfig {
    let mut definitions = BTreeMap::new();
    definitions.insert(
        "cleanup".to_string(),
        vec![TriggerDefinition::cron("@daily")],
    );
    definitions.insert(
        "import".to_string(),
        vec![
            TriggerDefinition::cron("*/15 * * * *").with_arguments(vec!["--batch=50".to_string()]),
            TriggerDefinition::default(),
        ],
    );
    TriggersConfig {
        definitions,
        ..TriggersConfig::default()
    }
}

#[tokio::test]
async fn rebuild_all_registers_every_cron_trigger() {
    let repository = Arc::new(MemoryTriggerRepository::new());
    let scheduler = Arc::new(InMemoryCronScheduler::new());
    let registrar = TriggerScheduleRegistrar::new(repository.clone(), scheduler.clone(), HANDLE_TRIGGER);

    let summaries = registrar.rebuild_all(&snapshot()).await.unwrap();

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries.iter().map(|s| s.scheduled).sum::<usize>(), 2);
    assert_eq!(repository.find_by_process("import").await.unwrap().len(), 2);

    let entries = scheduler.entries().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.command == HANDLE_TRIGGER));
}

#[tokio::test]
async fn rebuilding_one_process_leaves_others_alone() {
    let repository = Arc::new(MemoryTriggerRepository::new());
    let scheduler = Arc::new(InMemoryCronScheduler::new());
    let registrar = TriggerScheduleRegistrar::new(repository.clone(), scheduler.clone(), HANDLE_TRIGGER);
    registrar.rebuild_all(&snapshot()).await.unwrap();

    let summary = registrar.rebuild("import", vec![]).await.unwrap();

    assert_eq!(summary.removed, 1);
    assert!(summary.stored.is_empty());
    assert!(repository.find_by_process("import").await.unwrap().is_empty());
    assert_eq!(repository.find_by_process("cleanup").await.unwrap().len(), 1);

    let entries = scheduler.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].arguments()[0], "cleanup");
}

#[tokio::test]
async fn crontab_after_rebuild_points_at_the_new_trigger_ids() {
    let repository = Arc::new(MemoryTriggerRepository::new());
    let scheduler = Arc::new(InMemoryCronScheduler::new());
    let registrar = TriggerScheduleRegistrar::new(repository.clone(), scheduler.clone(), HANDLE_TRIGGER);
    registrar.rebuild_all(&snapshot()).await.unwrap();
    let summary = registrar
        .rebuild("import", vec![TriggerDefinition::cron("*/30 * * * *")])
        .await
        .unwrap();

    // A fresh process only sees what is stored, as `jobflow-trigger rebuild import` does
    let fresh = Arc::new(InMemoryCronScheduler::new());
    let registrar = TriggerScheduleRegistrar::new(repository.clone(), fresh.clone(), HANDLE_TRIGGER);
    let definitions = snapshot().definitions;
    registrar.rebuild("import", vec![TriggerDefinition::cron("*/30 * * * *")]).await.unwrap();
    for other in definitions.keys().filter(|name| name.as_str() != "import") {
        registrar.schedule_stored(other).await.unwrap();
    }

    let cleanup_id = repository.find_by_process("cleanup").await.unwrap()[0].id;
    let import_id = repository.find_by_process("import").await.unwrap()[0].id;
    assert!(import_id > summary.stored[0].id);

    let crontab = render_crontab(&fresh.entries().await.unwrap(), HANDLE_TRIGGER_PROGRAM);
    let lines: Vec<&str> = crontab.lines().skip(1).collect();
    assert_eq!(
        lines,
        vec![
            format!("@daily jobflow-trigger handle cleanup --id={cleanup_id}"),
            format!("*/30 * * * * jobflow-trigger handle import --id={import_id}"),
        ]
    );
    assert_eq!(scheduler.len(), 2);
}
