//! Job DTOs for backend communication

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Backend submission payload
///
/// Fields not modelled here are carried in `extra` and sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub job_type: String,
    /// Remote archive locations the backend fetches before running
    pub job_resources: Vec<String>,
    pub command: String,
    /// Output files the backend packs into the result archive
    pub backward_files: Vec<String>,
    /// Primary log file, relative to the job root
    #[serde(rename = "logFiles")]
    pub log_files: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request to register a job on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJob {
    pub job_type: String,
    #[serde(rename = "oss_path")]
    pub resource_paths: Vec<String>,
    pub payload: SubmissionPayload,
    pub program_id: Option<i64>,
    pub group_id: Option<i64>,
}

/// Identifiers assigned by the backend on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedJob {
    pub job_id: i64,
    pub group_id: i64,
}

/// Raw job detail record returned by the backend
///
/// Kept as the raw document so that diagnostics can show exactly what the
/// backend returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobDetail(pub Value);

/// Status field of a job detail record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedStatus {
    Code(i64),
    /// Present but not an integral number
    Unrecognized(Value),
}

impl fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Unrecognized(value) => write!(f, "{}", value),
        }
    }
}

impl JobDetail {
    /// Backend status, `None` only when the key is absent (transient stub records)
    pub fn status(&self) -> Option<ReportedStatus> {
        self.0.get("status").map(|value| match integral(value) {
            Some(code) => ReportedStatus::Code(code),
            None => ReportedStatus::Unrecognized(value.clone()),
        })
    }

    pub fn exit_code(&self) -> Option<i64> {
        self.0.get("exitCode").and_then(integral)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}

/// Reads integers, including floats with no fractional part
fn integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

impl From<Value> for JobDetail {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
