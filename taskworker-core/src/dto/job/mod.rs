//! Job DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to schedule a new job
///
/// `start_at` defaults to the time of scheduling, `finish_at` to no deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleJob {
    pub workflow_id: Uuid,
    pub start_task_id: Uuid,
    #[serde(default)]
    pub start_at: Option<i64>,
    #[serde(default)]
    pub finish_at: Option<i64>,
}

impl ScheduleJob {
    /// Schedule the workflow to start immediately without a deadline
    pub fn immediate(workflow_id: Uuid, start_task_id: Uuid) -> Self {
        Self {
            workflow_id,
            start_task_id,
            start_at: None,
            finish_at: None,
        }
    }
}
