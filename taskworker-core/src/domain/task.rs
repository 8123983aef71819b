//! Task domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work within a workflow instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub task_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    pub fn new(workflow_id: Uuid, task_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            task_type: task_type.into(),
            created_at: chrono::Utc::now(),
        }
    }
}
