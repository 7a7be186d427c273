use tracing::debug;

use super::{CollectionStatusCalculator, QueryStatusCalculator, StatusCalculator};
use crate::error::{JobflowError, Result};
use crate::models::{AggregateStatus, ChildJobView, Job};

/// Picks the status calculator matching the representation of a root job's
/// children. Selection has no side effects.
#[derive(Debug, Default, Clone)]
pub struct StatusCalculatorResolver {
    collection: CollectionStatusCalculator,
    query: QueryStatusCalculator,
}

impl StatusCalculatorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialized children use the collection calculator, a query handle
    /// uses the query calculator. A root job without any child view is
    /// rejected with `UnsupportedCollectionType` naming `null`.
    pub fn calculator_for_root_job(&self, root_job: &Job) -> Result<&dyn StatusCalculator> {
        if !root_job.is_root() {
            return Err(JobflowError::NotRootJob {
                job_id: root_job.id,
            });
        }

        let calculator: &dyn StatusCalculator = match &root_job.child_jobs {
            Some(ChildJobView::Materialized(_)) => &self.collection,
            Some(ChildJobView::Query(_)) => &self.query,
            None => {
                return Err(JobflowError::UnsupportedCollectionType {
                    type_name: "null".to_string(),
                })
            }
        };

        debug!(
            root_job_id = root_job.id,
            calculator = calculator.name(),
            "Resolved status calculator"
        );
        Ok(calculator)
    }

    /// Resolve and run in one step.
    pub async fn calculate(&self, root_job: &Job) -> Result<AggregateStatus> {
        self.calculator_for_root_job(root_job)?
            .calculate(root_job)
            .await
    }
}
