//! Service Module
//!
//! Business logic for scheduling and monitoring.
//! Services orchestrate between the stores and contain domain logic.

pub mod job;
pub mod monitor;
pub mod recent;

pub use job::JobService;
pub use monitor::{Monitor, StatsByJob};
pub use recent::{RecentSelector, SortAndSlice, select_recent};
