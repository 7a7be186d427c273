use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{aggregate, StatusCalculator};
use crate::error::{JobflowError, Result};
use crate::models::{AggregateStatus, ChildJobView, Job};

/// Calculator for root jobs whose children sit behind a store query.
///
/// Issues a single grouped read and never touches a job row.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryStatusCalculator;

impl QueryStatusCalculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatusCalculator for QueryStatusCalculator {
    fn name(&self) -> &'static str {
        "query"
    }

    #[instrument(skip(self, root_job), fields(root_job_id = root_job.id))]
    async fn calculate(&self, root_job: &Job) -> Result<AggregateStatus> {
        let query = match &root_job.child_jobs {
            Some(ChildJobView::Query(query)) => query,
            other => {
                return Err(JobflowError::UnsupportedCollectionType {
                    type_name: other
                        .as_ref()
                        .map_or("null", ChildJobView::type_name)
                        .to_string(),
                })
            }
        };

        let snapshot = query.snapshot().await?;
        let result = aggregate(&snapshot);
        debug!(
            children = snapshot.total(),
            status = %result.status,
            progress = ?result.progress,
            "Calculated root job status from aggregate query"
        );
        Ok(result)
    }
}
