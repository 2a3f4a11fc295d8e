//! Scripted backend and archiver doubles for unit tests

use anyhow::bail;
use async_trait::async_trait;
use cirrus_client::{BackendClient, ClientError, Result};
use cirrus_core::dto::job::{CreateJob, CreatedJob, JobDetail};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::archive::Archiver;
use crate::config::{Config, RemoteProfile};

/// Backend that replays scripted responses and records every call
pub struct MockBackend {
    created: CreatedJob,
    details: Mutex<VecDeque<JobDetail>>,
    log: String,
    result_url: Option<String>,
    fail_create: bool,
    pub create_calls: Mutex<Vec<CreateJob>>,
    pub detail_calls: Mutex<Vec<(i64, Option<i64>)>>,
    pub log_calls: Mutex<Vec<i64>>,
    pub result_url_calls: Mutex<Vec<String>>,
    pub downloads: Mutex<Vec<(String, PathBuf)>>,
    pub kill_calls: Mutex<Vec<i64>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            created: CreatedJob {
                job_id: 1001,
                group_id: 77,
            },
            details: Mutex::new(VecDeque::new()),
            log: "step 1 done\n".to_string(),
            result_url: None,
            fail_create: false,
            create_calls: Mutex::new(Vec::new()),
            detail_calls: Mutex::new(Vec::new()),
            log_calls: Mutex::new(Vec::new()),
            result_url_calls: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            kill_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_created(mut self, job_id: i64, group_id: i64) -> Self {
        self.created = CreatedJob { job_id, group_id };
        self
    }

    /// Queues detail responses, returned in order
    pub fn with_details(self, details: Vec<Value>) -> Self {
        self.details
            .lock()
            .unwrap()
            .extend(details.into_iter().map(JobDetail::from));
        self
    }

    pub fn with_result_url(mut self, url: &str) -> Self {
        self.result_url = Some(url.to_string());
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn detail_count(&self) -> usize {
        self.detail_calls.lock().unwrap().len()
    }

    pub fn log_count(&self) -> usize {
        self.log_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn create_job(&self, req: CreateJob) -> Result<CreatedJob> {
        self.create_calls.lock().unwrap().push(req);
        if self.fail_create {
            return Err(ClientError::Transport("connection reset".to_string()));
        }
        Ok(self.created)
    }

    async fn job_detail(&self, job_id: i64, group_id: Option<i64>) -> Result<JobDetail> {
        self.detail_calls.lock().unwrap().push((job_id, group_id));
        self.details
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::NotFound(format!("job {}", job_id)))
    }

    async fn job_log(&self, job_id: i64) -> Result<String> {
        self.log_calls.lock().unwrap().push(job_id);
        Ok(self.log.clone())
    }

    async fn result_url(&self, handle: &str) -> Result<Option<String>> {
        self.result_url_calls
            .lock()
            .unwrap()
            .push(handle.to_string());
        Ok(self.result_url.clone())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        std::fs::write(dest, b"archive-bytes")
            .map_err(|e| ClientError::InternalError(e.to_string()))?;
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));
        Ok(())
    }

    async fn kill(&self, job_id: i64) -> Result<()> {
        self.kill_calls.lock().unwrap().push(job_id);
        Ok(())
    }
}

/// Archiver that records calls instead of extracting
#[derive(Default)]
pub struct RecordingArchiver {
    pub unpacked: Mutex<Vec<(PathBuf, PathBuf)>>,
    pub fail: bool,
}

impl Archiver for RecordingArchiver {
    fn unpack(&self, archive: &Path, dest: &Path) -> anyhow::Result<()> {
        if self.fail {
            bail!("corrupt archive");
        }
        if !archive.exists() {
            bail!("archive {} does not exist", archive.display());
        }
        self.unpacked
            .lock()
            .unwrap()
            .push((archive.to_path_buf(), dest.to_path_buf()));
        Ok(())
    }
}

/// Builds a valid configuration, applying `input_data` overrides
pub fn config_with(input_data: Value) -> Config {
    let mut value = json!({
        "email": "user@example.com",
        "password": "secret",
        "program_id": 42,
        "input_data": { "job_type": "container" }
    });
    if let Value::Object(overrides) = input_data {
        for (key, v) in overrides {
            value["input_data"][key] = v;
        }
    }
    let profile: RemoteProfile = serde_json::from_value(value).unwrap();
    Config::resolve(profile, None).unwrap()
}

pub fn test_config() -> Config {
    config_with(json!({}))
}
