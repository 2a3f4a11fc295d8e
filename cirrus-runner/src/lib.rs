//! Cirrus Runner
//!
//! Dispatches jobs to an asynchronous remote compute backend and tracks them
//! to completion.
//!
//! Architecture:
//! - Configuration: Validated machine profile
//! - Session: Backend group shared by the jobs of one machine session
//! - Status: Translation of raw backend codes into lifecycle states
//! - Services: Submission, lifecycle monitoring and result retrieval
//! - Machine: The `Machine` trait and its cloud implementation
//!
//! The caller owns the poll loop. Each `poll` makes one pass against the
//! backend; the only wait inside the runner is the fixed cooldown before
//! re-reading a job detail that came back without a status.

pub mod archive;
pub mod config;
pub mod error;
pub mod machine;
pub mod service;
pub mod session;
pub mod status;

#[cfg(test)]
mod testing;

pub use archive::Archiver;
pub use config::{Config, Credentials, RemoteProfile};
pub use error::{DispatchError, Result};
pub use machine::{CloudMachine, MISSING_EXIT_CODE, Machine};
pub use session::Session;
pub use status::{BackendStatus, translate};
