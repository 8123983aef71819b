//! Store layer
//!
//! Collaborator contracts the scheduling and monitoring code depends on.
//! None of them promise any ordering of results; callers that need an order
//! sort client-side.
//!
//! All collaborators are trait-based so hosts can plug in their own backends
//! and tests can substitute stubs.

mod memory;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{Job, StatisticSet, Task, WorkflowInstance};
use crate::error::{Error, Result};

pub use memory::{InMemoryJobStore, InMemoryTaskStore, InMemoryWorkflowStore};

/// Default upper bound for a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Persistence for scheduled jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Looks up a job by its identifier
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>>;

    /// Returns every stored job in no particular order
    async fn find_all(&self) -> Result<Vec<Job>>;

    /// Inserts or replaces a job
    async fn save(&self, job: &Job) -> Result<()>;
}

/// Lookup of workflow instances
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn find_by_id(&self, workflow_id: Uuid) -> Result<Option<WorkflowInstance>>;
}

/// Lookup of tasks, scoped by the workflow they belong to
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, workflow_id: Uuid, task_id: Uuid) -> Result<Option<Task>>;
}

/// Computes the statistics of a finished job
///
/// Implementations return `Error::NotReady` when the measured data is not
/// available yet.
#[async_trait]
pub trait StatisticsService: Send + Sync {
    async fn compute(&self, job: &Job) -> Result<StatisticSet>;
}

/// Cancellation and timeout boundary applied to every store call
#[derive(Debug, Clone)]
pub struct StoreAccess {
    cancel: CancellationToken,
    timeout: Duration,
}

impl StoreAccess {
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    /// Access bound to a fresh, never-cancelled token
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(CancellationToken::new(), timeout)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one store call
    ///
    /// Fails with `Error::Cancelled` once the token fires and with
    /// `Error::StoreUnavailable` when the call outlives the timeout.
    pub async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            res = tokio::time::timeout(self.timeout, fut) => match res {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("{} timed out after {:?}", operation, self.timeout);
                    Err(Error::StoreUnavailable(format!(
                        "{} timed out after {:?}",
                        operation, self.timeout
                    )))
                }
            },
        }
    }
}

impl Default for StoreAccess {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_STORE_TIMEOUT)
    }
}
