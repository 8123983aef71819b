//! Job Service
//!
//! Scheduling and completion bookkeeping for jobs.

use std::sync::Arc;
use taskworker_core::domain::{Job, now_millis};
use taskworker_core::dto::job::ScheduleJob;
use taskworker_core::store::{JobStore, StoreAccess, TaskStore, WorkflowStore};
use taskworker_core::{Error, Result};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;

/// Schedules jobs and keeps their persisted state current
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    workflows: Arc<dyn WorkflowStore>,
    tasks: Arc<dyn TaskStore>,
    config: Config,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        workflows: Arc<dyn WorkflowStore>,
        tasks: Arc<dyn TaskStore>,
        config: Config,
    ) -> Self {
        Self {
            jobs,
            workflows,
            tasks,
            config,
        }
    }

    fn access(&self, cancel: &CancellationToken) -> StoreAccess {
        StoreAccess::new(cancel.clone(), self.config.store_timeout)
    }

    /// Create and persist a new job
    pub async fn schedule(&self, req: ScheduleJob, cancel: &CancellationToken) -> Result<Job> {
        let access = self.access(cancel);

        // Verify workflow and start task exist
        let workflow = access
            .call("workflow lookup", self.workflows.find_by_id(req.workflow_id))
            .await?
            .ok_or_else(|| Error::workflow_not_found(req.workflow_id))?;

        let start_task = access
            .call(
                "task lookup",
                self.tasks.find_by_id(req.workflow_id, req.start_task_id),
            )
            .await?
            .ok_or_else(|| Error::task_not_found(req.workflow_id, req.start_task_id))?;

        let start_at = req.start_at.unwrap_or_else(now_millis);
        let job = Job::with_deadline(workflow, start_task, start_at, req.finish_at.unwrap_or(0))?;

        access.call("job save", self.jobs.save(&job)).await?;

        tracing::info!(
            "Job scheduled: {} for workflow: {} (start: {}, deadline: {:?})",
            job.id(),
            job.workflow_id(),
            job.start_at(),
            job.deadline()
        );

        Ok(job)
    }

    /// Get a job by ID
    pub async fn get(&self, id: Uuid, cancel: &CancellationToken) -> Result<Job> {
        self.load(id, &self.access(cancel)).await
    }

    /// Move the start time and deadline of a job
    pub async fn reschedule(
        &self,
        id: Uuid,
        start_at: i64,
        finish_at: i64,
        cancel: &CancellationToken,
    ) -> Result<Job> {
        let access = self.access(cancel);
        let mut job = self.load(id, &access).await?;

        job.reschedule(start_at, finish_at)?;
        access.call("job save", self.jobs.save(&job)).await?;

        tracing::info!("Job {} rescheduled to start at {}", id, start_at);

        Ok(job)
    }

    /// Stamp the completion time of a job whose workflow has finished
    pub async fn record_completion(
        &self,
        id: Uuid,
        finished_at: i64,
        cancel: &CancellationToken,
    ) -> Result<Job> {
        let access = self.access(cancel);
        let mut job = self.load(id, &access).await?;

        if !job.is_finished(self.workflows.as_ref(), &access).await? {
            return Err(Error::NotReady(id));
        }

        if let Some(previous) = job.finished_at() {
            tracing::warn!(
                "Job {} already completed at {}, overwriting with {}",
                id,
                previous,
                finished_at
            );
        }

        job.mark_finished(finished_at);
        access.call("job save", self.jobs.save(&job)).await?;

        tracing::info!("Job {} completed at {}", id, finished_at);

        Ok(job)
    }

    async fn load(&self, id: Uuid, access: &StoreAccess) -> Result<Job> {
        access
            .call("job lookup", self.jobs.find_by_id(id))
            .await?
            .ok_or_else(|| Error::job_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskworker_core::domain::{Task, WorkflowInstance};
    use taskworker_core::store::{InMemoryJobStore, InMemoryTaskStore, InMemoryWorkflowStore};

    struct Fixture {
        jobs: InMemoryJobStore,
        workflows: InMemoryWorkflowStore,
        service: JobService,
        workflow: WorkflowInstance,
        task: Task,
    }

    async fn fixture() -> Fixture {
        let jobs = InMemoryJobStore::new();
        let workflows = InMemoryWorkflowStore::new();
        let tasks = InMemoryTaskStore::new();

        let workflow = WorkflowInstance::new("render");
        let task = Task::new(workflow.workflow_id, "split");
        workflows.insert(workflow.clone()).await;
        tasks.insert(task.clone()).await;

        let service = JobService::new(
            Arc::new(jobs.clone()),
            Arc::new(workflows.clone()),
            Arc::new(tasks),
            Config::default(),
        );

        Fixture {
            jobs,
            workflows,
            service,
            workflow,
            task,
        }
    }

    #[tokio::test]
    async fn test_schedule_persists_job() {
        let f = fixture().await;
        let cancel = CancellationToken::new();

        let job = f
            .service
            .schedule(
                ScheduleJob {
                    workflow_id: f.workflow.workflow_id,
                    start_task_id: f.task.id,
                    start_at: Some(1_000),
                    finish_at: Some(5_000),
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(job.name(), f.workflow.workflow_id.to_string());
        assert_eq!(job.deadline(), Some(5_000));

        let stored = f.service.get(job.id(), &cancel).await.unwrap();
        assert_eq!(stored.start_at(), 1_000);
        assert_eq!(stored.start_task_id(), f.task.id);
    }

    #[tokio::test]
    async fn test_schedule_immediate_defaults() {
        let f = fixture().await;
        let before = now_millis();

        let job = f
            .service
            .schedule(
                ScheduleJob::immediate(f.workflow.workflow_id, f.task.id),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(job.start_at() >= before);
        assert_eq!(job.finish_at(), 0);
    }

    #[tokio::test]
    async fn test_schedule_rejects_bad_window() {
        let f = fixture().await;

        let err = f
            .service
            .schedule(
                ScheduleJob {
                    workflow_id: f.workflow.workflow_id,
                    start_task_id: f.task.id,
                    start_at: Some(5_000),
                    finish_at: Some(1_000),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSchedule { .. }));
        assert!(f.jobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_schedule_unknown_references() {
        let f = fixture().await;
        let cancel = CancellationToken::new();

        let err = f
            .service
            .schedule(ScheduleJob::immediate(Uuid::new_v4(), f.task.id), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = f
            .service
            .schedule(
                ScheduleJob::immediate(f.workflow.workflow_id, Uuid::new_v4()),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reschedule() {
        let f = fixture().await;
        let cancel = CancellationToken::new();
        let job = f
            .service
            .schedule(
                ScheduleJob::immediate(f.workflow.workflow_id, f.task.id),
                &cancel,
            )
            .await
            .unwrap();

        let err = f
            .service
            .reschedule(job.id(), 9_000, 8_000, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchedule { .. }));

        let moved = f
            .service
            .reschedule(job.id(), 9_000, 10_000, &cancel)
            .await
            .unwrap();
        assert_eq!(moved.start_at(), 9_000);

        let stored = f.service.get(job.id(), &cancel).await.unwrap();
        assert_eq!((stored.start_at(), stored.finish_at()), (9_000, 10_000));
    }

    #[tokio::test]
    async fn test_record_completion_requires_finished_workflow() {
        let f = fixture().await;
        let cancel = CancellationToken::new();
        let job = f
            .service
            .schedule(
                ScheduleJob::immediate(f.workflow.workflow_id, f.task.id),
                &cancel,
            )
            .await
            .unwrap();

        let err = f
            .service
            .record_completion(job.id(), 7_000, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotReady(job.id()));

        f.workflows.mark_finished(f.workflow.workflow_id).await.unwrap();
        f.service
            .record_completion(job.id(), 7_000, &cancel)
            .await
            .unwrap();

        let stored = f.service.get(job.id(), &cancel).await.unwrap();
        assert_eq!(stored.finished_at(), Some(7_000));
    }

    #[tokio::test]
    async fn test_get_missing_and_unavailable() {
        let f = fixture().await;
        let cancel = CancellationToken::new();

        assert!(f.service.get(Uuid::new_v4(), &cancel).await.unwrap_err().is_not_found());

        f.jobs.set_unavailable(true);
        let err = f.service.get(Uuid::new_v4(), &cancel).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
