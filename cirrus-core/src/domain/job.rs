//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::handle::{HandleError, RemoteHandle};

/// Job submission record
///
/// Owned by the caller and persisted with the submission state. The runner
/// only writes `remote_handle`, `state` and `upload_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Locally unique content hash
    pub job_hash: String,
    /// Composite remote identifier, empty until submitted
    #[serde(default)]
    pub remote_handle: String,
    pub state: LifecycleState,
    pub tasks: Vec<Task>,
    /// Name of the generated shell script inside the work directory
    pub script_file_name: String,
    /// Remote location of the uploaded work archive, fixed on first submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_path: Option<String>,
}

impl Job {
    /// Creates an unsubmitted job
    pub fn new(job_hash: impl Into<String>, tasks: Vec<Task>) -> Self {
        let job_hash = job_hash.into();
        Self {
            script_file_name: format!("{}.sub", job_hash),
            job_hash,
            remote_handle: String::new(),
            state: LifecycleState::Unsubmitted,
            tasks,
            upload_path: None,
        }
    }

    /// Decodes the stored remote handle
    pub fn handle(&self) -> Result<RemoteHandle, HandleError> {
        RemoteHandle::decode(&self.remote_handle)
    }

    /// Name of the work archive uploaded for this job
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.job_hash)
    }

    /// Name of the marker file the job script touches once every task succeeded
    pub fn finish_tag_name(&self) -> String {
        format!("{}_job_tag_finished", self.job_hash)
    }

    /// Name of the result archive downloaded for this job
    pub fn result_archive_name(&self) -> String {
        format!("{}_back.zip", self.job_hash)
    }
}

/// A single unit of work inside a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Working subdirectory relative to the job root
    pub work_path: String,
    pub command: String,
    /// Output files to bring back, relative to `work_path`
    #[serde(default)]
    pub backward_files: Vec<String>,
    #[serde(default = "default_outlog")]
    pub outlog: String,
    #[serde(default = "default_errlog")]
    pub errlog: String,
}

fn default_outlog() -> String {
    "log".to_string()
}

fn default_errlog() -> String {
    "err".to_string()
}

impl Task {
    pub fn new(work_path: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            work_path: work_path.into(),
            command: command.into(),
            backward_files: Vec::new(),
            outlog: default_outlog(),
            errlog: default_errlog(),
        }
    }

    pub fn with_backward_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backward_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outlog(mut self, outlog: impl Into<String>) -> Self {
        self.outlog = outlog.into();
        self
    }
}

/// Backend-independent job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Unsubmitted,
    Waiting,
    Running,
    Finished,
    Terminated,
    Unknown,
}

impl LifecycleState {
    /// Finished and Terminated expect no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Terminated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unsubmitted => "unsubmitted",
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Terminated => "terminated",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_unsubmitted() {
        let job = Job::new("abc123", vec![Task::new("task.000", "echo hi")]);
        assert_eq!(job.state, LifecycleState::Unsubmitted);
        assert!(job.remote_handle.is_empty());
        assert_eq!(job.handle().unwrap(), RemoteHandle::Unsubmitted);
        assert_eq!(job.script_file_name, "abc123.sub");
        assert_eq!(job.archive_name(), "abc123.zip");
        assert_eq!(job.result_archive_name(), "abc123_back.zip");
        assert_eq!(job.finish_tag_name(), "abc123_job_tag_finished");
    }

    #[test]
    fn test_terminal_states() {
        assert!(LifecycleState::Finished.is_terminal());
        assert!(LifecycleState::Terminated.is_terminal());
        assert!(!LifecycleState::Running.is_terminal());
        assert!(!LifecycleState::Unknown.is_terminal());
    }

    #[test]
    fn test_job_deserializes_without_optional_fields() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "job_hash": "h",
            "state": "Waiting",
            "tasks": [{ "work_path": "t0", "command": "run" }],
            "script_file_name": "h.sub"
        }))
        .unwrap();

        assert!(job.remote_handle.is_empty());
        assert_eq!(job.upload_path, None);
        assert_eq!(job.tasks[0].outlog, "log");
        assert_eq!(job.tasks[0].errlog, "err");
    }
}
