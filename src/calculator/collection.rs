use async_trait::async_trait;
use tracing::debug;

use super::{aggregate, StatusCalculator};
use crate::error::{JobflowError, Result};
use crate::models::{AggregateStatus, ChildJobView, ChildStatusCounts, Job};

/// Calculator for root jobs whose children are already loaded.
/// Each child is visited exactly once.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionStatusCalculator;

impl CollectionStatusCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_children(&self, children: &[Job]) -> AggregateStatus {
        let counts: ChildStatusCounts = children
            .iter()
            .map(|child| (child.status, child.progress))
            .collect();
        aggregate(&counts)
    }
}

#[async_trait]
impl StatusCalculator for CollectionStatusCalculator {
    fn name(&self) -> &'static str {
        "collection"
    }

    async fn calculate(&self, root_job: &Job) -> Result<AggregateStatus> {
        match &root_job.child_jobs {
            Some(ChildJobView::Materialized(children)) => {
                let result = self.calculate_children(children);
                debug!(
                    root_job_id = root_job.id,
                    children = children.len(),
                    status = %result.status,
                    "Calculated root job status from loaded children"
                );
                Ok(result)
            }
            other => Err(JobflowError::UnsupportedCollectionType {
                type_name: other
                    .as_ref()
                    .map_or("null", ChildJobView::type_name)
                    .to_string(),
            }),
        }
    }
}
