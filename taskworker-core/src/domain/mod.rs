//! Core domain types
//!
//! A job only persists identifiers of the workflow instance and task it
//! belongs to. The instances themselves live in their own stores and are
//! resolved on demand.

pub mod job;
pub mod statistic;
pub mod task;
pub mod workflow;

pub use job::Job;
pub use statistic::{Statistic, StatisticSet};
pub use task::Task;
pub use workflow::WorkflowInstance;

/// Current wall clock time in milliseconds since epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
