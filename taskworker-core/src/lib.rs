//! Taskworker Core
//!
//! Core types and abstractions for scheduling and monitoring workflow jobs.
//!
//! This crate contains:
//! - Domain types: Job, WorkflowInstance, Task, Statistic
//! - Store traits: the collaborator contracts jobs and the monitor resolve against
//! - DTOs: requests accepted by the scheduling service

pub mod domain;
pub mod dto;
pub mod error;
pub mod store;

pub use error::{Error, Result};
