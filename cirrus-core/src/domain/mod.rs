//! Core domain types
//!
//! This module contains the core domain structures used across Cirrus crates.
//! These types represent the job records that the runner submits and monitors
//! and are persisted by the caller between sessions.

pub mod handle;
pub mod job;
