//! Job-related backend operations

use async_trait::async_trait;
use cirrus_core::dto::job::{CreateJob, CreatedJob, JobDetail};
use std::path::Path;

use crate::error::Result;

/// Transport to the remote compute backend
///
/// Implementations own authentication, request signing and storage access.
/// The runner only relies on the call shapes below and propagates every
/// error unchanged.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Register a job on the backend
    ///
    /// # Returns
    /// The numeric job id and the group the job was placed in
    async fn create_job(&self, req: CreateJob) -> Result<CreatedJob>;

    /// Fetch the raw detail record of a job
    ///
    /// # Arguments
    /// * `job_id` - The numeric backend job id
    /// * `group_id` - The group the job belongs to, if known
    async fn job_detail(&self, job_id: i64, group_id: Option<i64>) -> Result<JobDetail>;

    /// Fetch the execution log of a job
    async fn job_log(&self, job_id: i64) -> Result<String>;

    /// Ask for the download URL of a job's result archive
    ///
    /// # Arguments
    /// * `handle` - The composite remote handle of the job
    ///
    /// # Returns
    /// `None` when the job produced no downloadable artifact
    async fn result_url(&self, handle: &str) -> Result<Option<String>>;

    /// Download a URL to a local file
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;

    /// Kill a running job
    async fn kill(&self, job_id: i64) -> Result<()>;
}
