//! Data Transfer Objects exchanged with the remote backend
//!
//! These are the request and response shapes that cross the
//! `BackendClient` seam. They are built fresh per call and never persisted.

pub mod job;
