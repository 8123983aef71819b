//! Workflow instance domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Runtime record of one execution of a workflow definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub workflow_id: Uuid,
    pub name: String,
    pub finished: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl WorkflowInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            name: name.into(),
            finished: false,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn workflow_id(&self) -> Uuid {
        self.workflow_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn mark_finished(&mut self) {
        self.finished = true;
    }
}
