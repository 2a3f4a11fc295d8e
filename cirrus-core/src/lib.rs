//! Cirrus Core
//!
//! Core types and abstractions for dispatching jobs to a remote compute backend.
//!
//! This crate contains:
//! - Domain types: Job records, tasks, lifecycle states and the composite remote handle
//! - DTOs: Data transfer objects exchanged with the backend client

pub mod domain;
pub mod dto;

pub use domain::handle::{GROUP_SEPARATOR, HandleError, RemoteHandle};
pub use domain::job::{Job, LifecycleState, Task};
