//! Machine configuration
//!
//! Parses the remote profile of a machine file and validates the settings
//! the runner depends on: protocol version, grouping, exit-code policy,
//! program id and credentials.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DispatchError, Result};

/// Environment variable holding a pre-issued access ticket
pub const TICKET_ENV: &str = "BOHR_TICKET";

const DEFAULT_API_VERSION: i64 = 2;

/// Remote profile as written in a machine file
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_ignore_exit_code")]
    pub ignore_exit_code: bool,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub project_id: Option<i64>,
    /// Prefix of every uploaded resource location
    #[serde(default)]
    pub oss_bucket_url: String,
    /// Free-form settings copied into every submission payload
    #[serde(default)]
    pub input_data: Map<String, Value>,
}

fn default_retry_count() -> u32 {
    3
}

fn default_ignore_exit_code() -> bool {
    true
}

/// Credentials used by the backend transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Ticket(String),
    Account { account: String, password: String },
}

/// Validated machine configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_version: i64,
    /// Co-schedule jobs of a session in one backend group
    pub grouped: bool,
    /// Echo backend logs to stdout while polling
    pub output_log: bool,
    /// Retry budget handed to callers driving the poll loop
    pub retry_count: u32,
    /// Reclassify a terminated job with nonzero exit code as finished
    pub ignore_exit_code: bool,
    pub program_id: Option<i64>,
    pub job_type: String,
    pub oss_bucket_url: String,
    pub input_data: Map<String, Value>,
    pub credentials: Credentials,
}

impl Config {
    /// Creates configuration from a remote profile
    ///
    /// A ticket in the `BOHR_TICKET` environment variable takes precedence
    /// over the credentials of the profile.
    pub fn from_profile(profile: RemoteProfile) -> Result<Self> {
        Self::resolve(profile, std::env::var(TICKET_ENV).ok())
    }

    /// Creates configuration from the JSON form of a remote profile
    pub fn from_json(value: Value) -> Result<Self> {
        let profile: RemoteProfile = serde_json::from_value(value)
            .map_err(|e| DispatchError::Configuration(format!("invalid remote profile: {}", e)))?;
        Self::from_profile(profile)
    }

    /// Creates configuration with an explicitly supplied environment ticket
    pub fn resolve(profile: RemoteProfile, env_ticket: Option<String>) -> Result<Self> {
        let credentials = resolve_credentials(&profile, env_ticket)?;
        let api_version = api_version(&profile.input_data)?;

        let job_type = profile
            .input_data
            .get("job_type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default();

        let config = Self {
            api_version,
            grouped: flag(&profile.input_data, "grouped"),
            output_log: flag(&profile.input_data, "output_log"),
            retry_count: profile.retry_count,
            ignore_exit_code: profile.ignore_exit_code,
            program_id: profile.project_id.or(profile.program_id),
            job_type,
            oss_bucket_url: profile.oss_bucket_url,
            input_data: profile.input_data,
            credentials,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_version == 1 {
            return Err(DispatchError::Configuration(
                "api version 1 is deprecated, use version 2 instead".to_string(),
            ));
        }

        if self.job_type.is_empty() {
            return Err(DispatchError::Configuration(
                "can not find job_type in input_data, please check your machine file".to_string(),
            ));
        }

        Ok(())
    }
}

fn resolve_credentials(profile: &RemoteProfile, env_ticket: Option<String>) -> Result<Credentials> {
    if let Some(ticket) = env_ticket.or_else(|| profile.ticket.clone()) {
        return Ok(Credentials::Ticket(ticket));
    }

    if profile.email.is_none() && profile.username.is_some() {
        return Err(DispatchError::Configuration(
            "username is no longer supported, please use email instead".to_string(),
        ));
    }

    let account = profile
        .email
        .clone()
        .or_else(|| profile.phone.clone())
        .ok_or_else(|| {
            DispatchError::Configuration(
                "can not find email/phone number in remote_profile, please check your machine file"
                    .to_string(),
            )
        })?;

    let password = profile.password.clone().ok_or_else(|| {
        DispatchError::Configuration(
            "can not find password in remote_profile, please check your machine file".to_string(),
        )
    })?;

    Ok(Credentials::Account { account, password })
}

/// `lebesgue_version` overrides `api_version` when both are present
fn api_version(input_data: &Map<String, Value>) -> Result<i64> {
    let mut version = DEFAULT_API_VERSION;
    for key in ["api_version", "lebesgue_version"] {
        if let Some(value) = input_data.get(key) {
            version = value.as_i64().ok_or_else(|| {
                DispatchError::Configuration(format!("{} must be an integer, got {}", key, value))
            })?;
        }
    }
    Ok(version)
}

fn flag(input_data: &Map<String, Value>, key: &str) -> bool {
    input_data.get(key).and_then(Value::as_bool).unwrap_or(false)
}
