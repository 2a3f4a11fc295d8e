//! Error types for the runner

use cirrus_client::ClientError;
use cirrus_core::HandleError;
use cirrus_core::dto::job::JobDetail;
use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors surfaced by submission, monitoring and retrieval
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Machine profile is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored remote handle cannot be parsed
    #[error(transparent)]
    MalformedIdentifier(#[from] HandleError),

    /// Backend returned no status twice in a row
    #[error(
        "Cannot find job information on the backend for job {handle}; \
         first response: {first}; retry response: {second}. \
         To resubmit this job, delete the submission file containing '{handle}' and try again"
    )]
    LostJob {
        handle: String,
        first: JobDetail,
        second: JobDetail,
    },

    /// Operation requires a strictly positive backend job id
    #[error("Cannot parse a job id from remote handle '{0}'")]
    InvalidJobId(String),

    /// Job record cannot be submitted as-is
    #[error("Invalid job {job_hash}: {reason}")]
    InvalidJob { job_hash: String, reason: String },

    /// Transport failure, passed through unchanged
    #[error(transparent)]
    Backend(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result archive could not be unpacked
    #[error(transparent)]
    Archive(#[from] anyhow::Error),
}
