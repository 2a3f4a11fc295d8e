//! Cirrus backend client
//!
//! The seam between the runner and the remote compute backend. This crate
//! defines the operations the runner consumes and the errors they may
//! return; concrete transports live with whoever holds the credentials.
//!
//! # Example
//!
//! ```no_run
//! use cirrus_client::BackendClient;
//!
//! async fn print_log(client: &dyn BackendClient, job_id: i64) -> cirrus_client::Result<()> {
//!     let log = client.job_log(job_id).await?;
//!     print!("{}", log);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use jobs::BackendClient;
