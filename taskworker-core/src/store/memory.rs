//! In-memory stores
//!
//! Clonable, thread-safe stores backed by hash maps. Every clone shares the
//! same data. Each store can be switched to an unavailable state in which
//! every call fails with `Error::StoreUnavailable`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{JobStore, TaskStore, WorkflowStore};
use crate::domain::{Job, Task, WorkflowInstance};
use crate::error::{Error, Result};

#[derive(Clone, Default)]
struct Availability(Arc<AtomicBool>);

impl Availability {
    fn set_unavailable(&self, unavailable: bool) {
        self.0.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self, store: &str) -> Result<()> {
        if self.0.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable(format!("{} store is offline", store)));
        }
        Ok(())
    }
}

/// In-memory implementation of JobStore
#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    availability: Availability,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set_unavailable(unavailable);
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        self.availability.check("job")?;
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Job>> {
        self.availability.check("job")?;
        Ok(self.jobs.read().await.values().cloned().collect())
    }

    async fn save(&self, job: &Job) -> Result<()> {
        self.availability.check("job")?;
        // Only persisted state goes in; resolved associations stay with the caller.
        let mut stored = job.clone();
        stored.invalidate_associations();
        self.jobs.write().await.insert(job.id(), stored);
        Ok(())
    }
}

/// In-memory implementation of WorkflowStore
#[derive(Clone, Default)]
pub struct InMemoryWorkflowStore {
    workflows: Arc<RwLock<HashMap<Uuid, WorkflowInstance>>>,
    availability: Availability,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a workflow instance
    pub async fn insert(&self, workflow: WorkflowInstance) {
        self.workflows
            .write()
            .await
            .insert(workflow.workflow_id, workflow);
    }

    /// Removes a workflow instance, returning whether it existed
    pub async fn remove(&self, workflow_id: Uuid) -> bool {
        self.workflows.write().await.remove(&workflow_id).is_some()
    }

    /// Flags a stored workflow instance as finished
    pub async fn mark_finished(&self, workflow_id: Uuid) -> Result<()> {
        let mut workflows = self.workflows.write().await;
        let workflow = workflows
            .get_mut(&workflow_id)
            .ok_or_else(|| Error::workflow_not_found(workflow_id))?;
        workflow.mark_finished();
        Ok(())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set_unavailable(unavailable);
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn find_by_id(&self, workflow_id: Uuid) -> Result<Option<WorkflowInstance>> {
        self.availability.check("workflow")?;
        Ok(self.workflows.read().await.get(&workflow_id).cloned())
    }
}

/// In-memory implementation of TaskStore
#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<(Uuid, Uuid), Task>>>,
    availability: Availability,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, task: Task) {
        self.tasks
            .write()
            .await
            .insert((task.workflow_id, task.id), task);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set_unavailable(unavailable);
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find_by_id(&self, workflow_id: Uuid, task_id: Uuid) -> Result<Option<Task>> {
        self.availability.check("task")?;
        Ok(self.tasks.read().await.get(&(workflow_id, task_id)).cloned())
    }
}
