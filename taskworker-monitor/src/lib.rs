//! Taskworker Monitor
//!
//! Scheduling and statistics services on top of the taskworker core types.
//!
//! - `JobService` schedules jobs and records their completion
//! - `Monitor` serves cached per-job statistics, for all jobs or for the most
//!   recently finished ones

pub mod config;
pub mod service;

pub use config::Config;
pub use service::{JobService, Monitor, RecentSelector, SortAndSlice, StatsByJob, select_recent};
