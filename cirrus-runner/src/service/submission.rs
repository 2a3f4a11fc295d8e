//! Submission service
//!
//! Builds the backend payload for a job and registers it:
//! - Deriving (once) the remote upload path of the work archive
//! - Collecting the backward files of every task
//! - Creating the job and storing its composite handle

use cirrus_client::BackendClient;
use cirrus_core::dto::job::{CreateJob, SubmissionPayload};
use cirrus_core::{Job, LifecycleState, RemoteHandle};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{DispatchError, Result};
use crate::session::Session;

/// Builds submission payloads and registers jobs on the backend
pub struct SubmissionBuilder {
    client: Arc<dyn BackendClient>,
    config: Arc<Config>,
}

impl SubmissionBuilder {
    pub fn new(client: Arc<dyn BackendClient>, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Returns the remote upload path of the job's work archive
    ///
    /// The first call derives `program/<program_id>/<uuid>/<archive>` and
    /// stores it on the job; later calls return the stored path so that a
    /// retried submission reuses the same remote location.
    pub fn upload_path(&self, job: &mut Job) -> String {
        if let Some(path) = job.upload_path.as_ref().filter(|p| !p.is_empty()) {
            return path.clone();
        }

        let program_id = self.config.program_id.unwrap_or_else(|| {
            warn!("Can not find program id in remote profile, uploading to default program id 0");
            0
        });

        let path = format!(
            "program/{}/{}/{}",
            program_id,
            Uuid::new_v4(),
            job.archive_name()
        );
        job.upload_path = Some(path.clone());
        path
    }

    /// Collects `work_path/backward_file` across all tasks, without duplicates
    pub fn backward_files(job: &Job) -> Vec<String> {
        job.tasks
            .iter()
            .flat_map(|task| {
                task.backward_files
                    .iter()
                    .map(|file| join_remote(&task.work_path, file))
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Assembles the submission payload for a job
    pub fn build(&self, job: &mut Job) -> Result<SubmissionPayload> {
        let first = job.tasks.first().ok_or_else(|| DispatchError::InvalidJob {
            job_hash: job.job_hash.clone(),
            reason: "job has no tasks".to_string(),
        })?;
        let log_files = join_remote(&first.work_path, &first.outlog);

        let upload_path = self.upload_path(job);

        let mut extra = self.config.input_data.clone();
        for key in ["job_type", "command", "logFiles"] {
            extra.remove(key);
        }

        let mut job_resources = take_string_list(&mut extra, "job_resources");
        job_resources.push(format!("{}{}", self.config.oss_bucket_url, upload_path));

        let mut backward_files = take_string_list(&mut extra, "backward_files");
        if backward_files.is_empty() {
            backward_files = Self::backward_files(job);
        }

        Ok(SubmissionPayload {
            job_type: self.config.job_type.clone(),
            job_resources,
            command: format!("bash {}", job.script_file_name),
            backward_files,
            log_files,
            extra,
        })
    }

    /// Registers the job on the backend
    ///
    /// Stores the composite handle on the job and moves it to `Waiting`.
    /// Transport failures are returned unchanged; nothing is retried here.
    ///
    /// # Returns
    /// The composite remote handle
    pub async fn submit(&self, job: &mut Job, session: &mut Session) -> Result<String> {
        let payload = self.build(job)?;

        if self.config.program_id.is_none() {
            warn!("program_id is compulsory, the backend will assign its default program");
        }

        let created = self
            .client
            .create_job(CreateJob {
                job_type: payload.job_type.clone(),
                resource_paths: payload.job_resources.clone(),
                payload,
                program_id: self.config.program_id,
                group_id: session.group_id(),
            })
            .await?;

        if self.config.grouped {
            session.adopt_group(created.group_id);
        }

        job.remote_handle = RemoteHandle::encode(created.job_id, created.group_id);
        job.state = LifecycleState::Waiting;

        info!("Submitted job {} as {}", job.job_hash, job.remote_handle);

        Ok(job.remote_handle.clone())
    }
}

/// Joins remote relative paths with `/`
fn join_remote(base: &str, name: &str) -> String {
    if base.is_empty() || name.starts_with('/') {
        name.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

fn take_string_list(map: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match map.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(item)) if !item.is_empty() => vec![item],
        _ => Vec::new(),
    }
}
