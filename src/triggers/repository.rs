//! Trigger lookup and the clear-and-reload used by schedule rebuilds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{TransitionTrigger, TriggerDefinition};

#[async_trait]
pub trait TriggerRepository: Send + Sync {
    async fn find_by_id(&self, trigger_id: i64) -> Result<Option<TransitionTrigger>>;

    async fn find_by_process(&self, process_name: &str) -> Result<Vec<TransitionTrigger>>;

    /// Drop every trigger of `process_name` and store `definitions` in their
    /// place, atomically. Returns the stored triggers with their new ids.
    async fn replace_for_process(
        &self,
        process_name: &str,
        definitions: Vec<TriggerDefinition>,
    ) -> Result<Vec<TransitionTrigger>>;
}

#[derive(Debug, Default)]
struct MemoryTriggers {
    next_id: i64,
    triggers: BTreeMap<i64, TransitionTrigger>,
}

#[derive(Debug, Default)]
pub struct MemoryTriggerRepository {
    state: RwLock<MemoryTriggers>,
}

impl MemoryTriggerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with triggers carrying fixed ids.
    pub fn with_triggers(triggers: impl IntoIterator<Item = TransitionTrigger>) -> Self {
        let repository = Self::new();
        {
            let mut state = repository.state.write();
            for trigger in triggers {
                state.next_id = state.next_id.max(trigger.id);
                state.triggers.insert(trigger.id, trigger);
            }
        }
        repository
    }
}

#[async_trait]
impl TriggerRepository for MemoryTriggerRepository {
    async fn find_by_id(&self, trigger_id: i64) -> Result<Option<TransitionTrigger>> {
        Ok(self.state.read().triggers.get(&trigger_id).cloned())
    }

    async fn find_by_process(&self, process_name: &str) -> Result<Vec<TransitionTrigger>> {
        Ok(self
            .state
            .read()
            .triggers
            .values()
            .filter(|trigger| trigger.process_name == process_name)
            .cloned()
            .collect())
    }

    async fn replace_for_process(
        &self,
        process_name: &str,
        definitions: Vec<TriggerDefinition>,
    ) -> Result<Vec<TransitionTrigger>> {
        let mut state = self.state.write();
        state
            .triggers
            .retain(|_, trigger| trigger.process_name != process_name);

        let now = Utc::now();
        let mut stored = Vec::with_capacity(definitions.len());
        for definition in definitions {
            state.next_id += 1;
            let trigger =
                TransitionTrigger::from_definition(state.next_id, process_name, definition, now);
            state.triggers.insert(trigger.id, trigger.clone());
            stored.push(trigger);
        }
        Ok(stored)
    }
}

#[derive(Debug, FromRow)]
struct TriggerRow {
    id: i64,
    process_name: String,
    cron: Option<String>,
    arguments: Vec<String>,
    queue: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TriggerRow> for TransitionTrigger {
    fn from(row: TriggerRow) -> Self {
        Self {
            id: row.id,
            process_name: row.process_name,
            cron: row.cron,
            arguments: row.arguments,
            queue: row.queue,
            created_at: row.created_at,
        }
    }
}

/// Triggers stored in `jobflow_transition_triggers`
#[derive(Clone)]
pub struct PgTriggerRepository {
    pool: PgPool,
}

impl PgTriggerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TriggerRepository for PgTriggerRepository {
    async fn find_by_id(&self, trigger_id: i64) -> Result<Option<TransitionTrigger>> {
        let row = sqlx::query_as::<_, TriggerRow>(
            r#"
            SELECT id, process_name, cron, arguments, queue, created_at
            FROM jobflow_transition_triggers
            WHERE id = $1
            "#,
        )
        .bind(trigger_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TransitionTrigger::from))
    }

    async fn find_by_process(&self, process_name: &str) -> Result<Vec<TransitionTrigger>> {
        let rows = sqlx::query_as::<_, TriggerRow>(
            r#"
            SELECT id, process_name, cron, arguments, queue, created_at
            FROM jobflow_transition_triggers
            WHERE process_name = $1
            ORDER BY id
            "#,
        )
        .bind(process_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransitionTrigger::from).collect())
    }

    #[instrument(skip(self, definitions), fields(count = definitions.len()))]
    async fn replace_for_process(
        &self,
        process_name: &str,
        definitions: Vec<TriggerDefinition>,
    ) -> Result<Vec<TransitionTrigger>> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM jobflow_transition_triggers WHERE process_name = $1")
            .bind(process_name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut stored = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let row = sqlx::query_as::<_, TriggerRow>(
                r#"
                INSERT INTO jobflow_transition_triggers (process_name, cron, arguments, queue, created_at)
                VALUES ($1, $2, $3, $4, NOW())
                RETURNING id, process_name, cron, arguments, queue, created_at
                "#,
            )
            .bind(process_name)
            .bind(definition.cron)
            .bind(definition.arguments)
            .bind(definition.queue)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(TransitionTrigger::from(row));
        }

        tx.commit().await?;
        debug!(removed, stored = stored.len(), "Replaced process triggers");
        Ok(stored)
    }
}
