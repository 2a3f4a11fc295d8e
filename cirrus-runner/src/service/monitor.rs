//! Lifecycle monitor
//!
//! Polls the backend for a submitted job and translates its status. On a
//! finished job the execution log is fetched and the results are retrieved.
//! The monitor never writes the job's stored state; callers apply the
//! returned state themselves.

use cirrus_client::BackendClient;
use cirrus_core::dto::job::{JobDetail, ReportedStatus};
use cirrus_core::{Job, LifecycleState};
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{DispatchError, Result};
use crate::service::retrieval::ResultRetriever;
use crate::session::Session;
use crate::status::translate;

/// Wait before re-reading a detail record that came back without a status
pub const MISSING_STATUS_COOLDOWN: Duration = Duration::from_secs(60);

/// Polls job details and drives completion side effects
pub struct LifecycleMonitor {
    client: Arc<dyn BackendClient>,
    config: Arc<Config>,
    retriever: ResultRetriever,
}

impl LifecycleMonitor {
    pub fn new(
        client: Arc<dyn BackendClient>,
        config: Arc<Config>,
        retriever: ResultRetriever,
    ) -> Self {
        Self {
            client,
            config,
            retriever,
        }
    }

    /// Polls the backend once and returns the job's lifecycle state
    ///
    /// An unsubmitted job returns immediately without a backend call. A
    /// detail record without a status is re-read once after
    /// [`MISSING_STATUS_COOLDOWN`]; a second miss is a [`DispatchError::LostJob`].
    pub async fn poll(&self, job: &Job, session: &mut Session) -> Result<LifecycleState> {
        if job.remote_handle.is_empty() {
            return Ok(LifecycleState::Unsubmitted);
        }

        let handle = job.handle()?;
        let Some(job_id) = handle.job_id() else {
            return Ok(LifecycleState::Unsubmitted);
        };

        if handle.is_legacy() {
            warn!(
                "Job {} uses legacy handle '{}' without a group id; resubmit to migrate it",
                job.job_hash, job.remote_handle
            );
        }

        if let Some(group_id) = handle.group_id() {
            if self.config.grouped && session.group_id() != Some(group_id) {
                info!(
                    "Adopting group {} from handle {} (session had {:?})",
                    group_id,
                    job.remote_handle,
                    session.group_id()
                );
                session.adopt_group(group_id);
            }
        }

        debug!("Checking status of job {} (hash {})", job.remote_handle, job.job_hash);

        let (status, detail) = self.fetch_status(job, job_id, handle.group_id()).await?;
        let exit_code = detail.exit_code().unwrap_or(0);
        debug!(
            "Job {} reported status {} (exit code {})",
            job.remote_handle, status, exit_code
        );
        let state = translate(status, exit_code, self.config.ignore_exit_code);

        match state {
            LifecycleState::Finished => {
                let log = self.client.job_log(job_id).await?;
                if self.config.output_log {
                    print!("{}", log);
                }
                self.retriever.retrieve(job).await?;
            }
            LifecycleState::Running if self.config.output_log => {
                match self.client.job_log(job_id).await {
                    Ok(log) => print!("{}", log),
                    Err(e) => warn!("Failed to fetch log of job {}: {}", job.remote_handle, e),
                }
            }
            _ => {}
        }

        Ok(state)
    }

    /// Reads the job detail, retrying once when the status field is missing
    async fn fetch_status(
        &self,
        job: &Job,
        job_id: i64,
        group_id: Option<i64>,
    ) -> Result<(ReportedStatus, JobDetail)> {
        let first = self.client.job_detail(job_id, group_id).await?;
        if let Some(status) = first.status() {
            return Ok((status, first));
        }

        error!(
            "Cannot find job information for job {}: {}; retrying once after {:?}",
            job.remote_handle, first, MISSING_STATUS_COOLDOWN
        );
        time::sleep(MISSING_STATUS_COOLDOWN).await;

        let second = self.client.job_detail(job_id, group_id).await?;
        match second.status() {
            Some(status) => Ok((status, second)),
            None => Err(DispatchError::LostJob {
                handle: job.remote_handle.clone(),
                first,
                second,
            }),
        }
    }
}
