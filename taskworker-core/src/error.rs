//! Error types for scheduling and monitoring

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by jobs, stores and the statistics pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A non-zero deadline precedes the start time
    #[error("Invalid schedule: finish time {finish_at} is before start time {start_at}")]
    InvalidSchedule {
        /// Requested start time in milliseconds since epoch
        start_at: i64,
        /// Requested deadline in milliseconds since epoch
        finish_at: i64,
    },

    /// A referenced entity does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Statistics were requested for a job whose workflow has not finished
    #[error("Job {0} is not finished yet")]
    NotReady(Uuid),

    /// A backing store or the statistics service could not be reached, or
    /// did not answer within the configured timeout
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The statistics service failed for a reason other than readiness
    #[error("Statistics computation failed: {0}")]
    Computation(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a not found error for a workflow instance
    pub fn workflow_not_found(workflow_id: Uuid) -> Self {
        Self::NotFound(format!("workflow {}", workflow_id))
    }

    /// Create a not found error for a task
    pub fn task_not_found(workflow_id: Uuid, task_id: Uuid) -> Self {
        Self::NotFound(format!("task {} of workflow {}", task_id, workflow_id))
    }

    /// Create a not found error for a job
    pub fn job_not_found(job_id: Uuid) -> Self {
        Self::NotFound(format!("job {}", job_id))
    }

    /// Check whether this error must abort a whole aggregate query
    ///
    /// Store outages and cancellation end the call; anything else only
    /// concerns the single job being processed.
    pub fn aborts_aggregate(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Cancelled)
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborts_aggregate() {
        assert!(Error::StoreUnavailable("down".to_string()).aborts_aggregate());
        assert!(Error::Cancelled.aborts_aggregate());
        assert!(!Error::NotReady(Uuid::new_v4()).aborts_aggregate());
        assert!(!Error::workflow_not_found(Uuid::new_v4()).aborts_aggregate());
        assert!(!Error::Computation("boom".to_string()).aborts_aggregate());
    }

    #[test]
    fn test_invalid_schedule_message() {
        let err = Error::InvalidSchedule {
            start_at: 200,
            finish_at: 100,
        };
        assert_eq!(
            err.to_string(),
            "Invalid schedule: finish time 100 is before start time 200"
        );
    }
}
