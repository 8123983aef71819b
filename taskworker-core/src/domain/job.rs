//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StatisticSet, Task, WorkflowInstance, now_millis};
use crate::error::{Error, Result};
use crate::store::{StatisticsService, StoreAccess, TaskStore, WorkflowStore};

/// A scheduled run of a workflow instance, starting with its first task
///
/// A job starts immediately or at a later point in time and may carry a
/// deadline. Only the identifiers of the workflow instance and start task are
/// persisted; the instances themselves are looked up on first access and
/// kept for the lifetime of this value.
///
/// Caches are plain fields behind `&mut self`, so a job has one writer at a
/// time. Share it across tasks only behind a lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: Uuid,
    workflow_id: Uuid,
    start_task_id: Uuid,
    start_at: i64,
    finish_at: i64,
    #[serde(default)]
    finished_at: Option<i64>,
    #[serde(default)]
    statistics: Option<StatisticSet>,
    #[serde(skip)]
    workflow: Option<WorkflowInstance>,
    #[serde(skip)]
    start_task: Option<Task>,
}

impl Job {
    /// Create a job that starts immediately and has no deadline
    pub fn new(workflow: WorkflowInstance, start_task: Task) -> Self {
        Self::starting_at(workflow, start_task, now_millis())
    }

    /// Create a job that starts at `start_at` and has no deadline
    pub fn starting_at(workflow: WorkflowInstance, start_task: Task, start_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id: workflow.workflow_id,
            start_task_id: start_task.id,
            start_at,
            finish_at: 0,
            finished_at: None,
            statistics: None,
            workflow: Some(workflow),
            start_task: Some(start_task),
        }
    }

    /// Create a job that starts at `start_at` and must finish by `finish_at`
    ///
    /// A `finish_at` of 0 means no deadline.
    pub fn with_deadline(
        workflow: WorkflowInstance,
        start_task: Task,
        start_at: i64,
        finish_at: i64,
    ) -> Result<Self> {
        validate_window(start_at, finish_at)?;

        let mut job = Self::starting_at(workflow, start_task, start_at);
        job.finish_at = finish_at;
        Ok(job)
    }

    /// Create a job that starts immediately and must finish by `finish_at`
    pub fn due_by(workflow: WorkflowInstance, start_task: Task, finish_at: i64) -> Result<Self> {
        Self::with_deadline(workflow, start_task, now_millis(), finish_at)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn workflow_id(&self) -> Uuid {
        self.workflow_id
    }

    pub fn start_task_id(&self) -> Uuid {
        self.start_task_id
    }

    /// The name of a job is the identifier of its workflow instance
    pub fn name(&self) -> String {
        self.workflow_id.to_string()
    }

    pub fn start_at(&self) -> i64 {
        self.start_at
    }

    /// Deadline in milliseconds since epoch, 0 when there is none
    pub fn finish_at(&self) -> i64 {
        self.finish_at
    }

    pub fn deadline(&self) -> Option<i64> {
        (self.finish_at != 0).then_some(self.finish_at)
    }

    /// When the job actually completed, if it has
    pub fn finished_at(&self) -> Option<i64> {
        self.finished_at
    }

    pub fn mark_finished(&mut self, at: i64) {
        self.finished_at = Some(at);
    }

    pub fn set_start_at(&mut self, start_at: i64) -> Result<()> {
        validate_window(start_at, self.finish_at)?;
        self.start_at = start_at;
        Ok(())
    }

    pub fn set_finish_at(&mut self, finish_at: i64) -> Result<()> {
        validate_window(self.start_at, finish_at)?;
        self.finish_at = finish_at;
        Ok(())
    }

    /// Replace start time and deadline together
    ///
    /// Only the final pair is validated, so a window can be moved past its
    /// old deadline in one step. Nothing changes on error.
    pub fn reschedule(&mut self, start_at: i64, finish_at: i64) -> Result<()> {
        validate_window(start_at, finish_at)?;
        self.start_at = start_at;
        self.finish_at = finish_at;
        Ok(())
    }

    /// Get the workflow instance, looking it up on first access
    pub async fn workflow(
        &mut self,
        store: &dyn WorkflowStore,
        access: &StoreAccess,
    ) -> Result<&WorkflowInstance> {
        let workflow = match self.workflow.take() {
            Some(workflow) => workflow,
            None => access
                .call("workflow lookup", store.find_by_id(self.workflow_id))
                .await?
                .ok_or_else(|| Error::workflow_not_found(self.workflow_id))?,
        };

        Ok(&*self.workflow.insert(workflow))
    }

    /// Get the first task of the workflow, looking it up on first access
    pub async fn start_task(&mut self, store: &dyn TaskStore, access: &StoreAccess) -> Result<&Task> {
        let task = match self.start_task.take() {
            Some(task) => task,
            None => access
                .call(
                    "task lookup",
                    store.find_by_id(self.workflow_id, self.start_task_id),
                )
                .await?
                .ok_or_else(|| Error::task_not_found(self.workflow_id, self.start_task_id))?,
        };

        Ok(&*self.start_task.insert(task))
    }

    /// A job is finished once its workflow instance has been marked finished
    pub async fn is_finished(
        &mut self,
        store: &dyn WorkflowStore,
        access: &StoreAccess,
    ) -> Result<bool> {
        Ok(self.workflow(store, access).await?.is_finished())
    }

    pub fn is_workflow_resolved(&self) -> bool {
        self.workflow.is_some()
    }

    pub fn is_start_task_resolved(&self) -> bool {
        self.start_task.is_some()
    }

    /// Drop resolved instances; the next access looks them up again
    pub fn invalidate_associations(&mut self) {
        self.workflow = None;
        self.start_task = None;
    }

    pub fn has_statistics(&self) -> bool {
        self.statistics.is_some()
    }

    pub fn statistics(&self) -> Option<&StatisticSet> {
        self.statistics.as_ref()
    }

    pub fn set_statistics(&mut self, statistics: StatisticSet) {
        self.statistics = Some(statistics);
    }

    pub fn invalidate_statistics(&mut self) {
        self.statistics = None;
    }

    /// Compute and cache the statistics of this job
    ///
    /// Returns the cached set without calling the service when one exists.
    /// Fails with `Error::NotReady` while the workflow is still running.
    pub async fn compute_statistics(
        &mut self,
        service: &dyn StatisticsService,
        workflows: &dyn WorkflowStore,
        access: &StoreAccess,
    ) -> Result<&StatisticSet> {
        let statistics = match self.statistics.take() {
            Some(statistics) => statistics,
            None => {
                if !self.is_finished(workflows, access).await? {
                    return Err(Error::NotReady(self.id));
                }
                tracing::debug!("Computing statistics for job {}", self.id);
                access
                    .call("statistics computation", service.compute(self))
                    .await?
            }
        };

        Ok(&*self.statistics.insert(statistics))
    }
}

/// Check that a non-zero deadline does not precede the start time
pub fn validate_window(start_at: i64, finish_at: i64) -> Result<()> {
    if finish_at != 0 && finish_at < start_at {
        return Err(Error::InvalidSchedule {
            start_at,
            finish_at,
        });
    }
    Ok(())
}
