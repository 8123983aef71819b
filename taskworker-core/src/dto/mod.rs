//! Data Transfer Objects
//!
//! Requests handed to the scheduling service by the host application.

pub mod job;
