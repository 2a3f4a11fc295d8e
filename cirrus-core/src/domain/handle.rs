//! Composite remote job identifier
//!
//! A submitted job is tracked through a single string of the form
//! `<job_id>:job_group_id:<group_id>`. That token is persisted with the
//! submission state, so the format must stay stable for jobs that were
//! submitted by earlier sessions and have not completed yet.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the job id and the group id
pub const GROUP_SEPARATOR: &str = ":job_group_id:";

/// Errors produced while decoding a remote handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("Malformed remote handle '{handle}': {reason}")]
    Malformed { handle: String, reason: String },
}

/// Decoded form of a job's remote handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteHandle {
    /// Empty handle, the job was never submitted
    Unsubmitted,
    /// Bare job id written by the older single-id scheme
    Legacy { job_id: i64 },
    Grouped { job_id: i64, group_id: i64 },
}

impl RemoteHandle {
    /// Encodes a job id and group id into the persisted handle format
    pub fn encode(job_id: i64, group_id: i64) -> String {
        format!("{}{}{}", job_id, GROUP_SEPARATOR, group_id)
    }

    /// Decodes a persisted handle
    ///
    /// An empty string is the unsubmitted condition rather than an error. A
    /// handle without the group separator is read as a bare job id.
    pub fn decode(handle: &str) -> Result<Self, HandleError> {
        if handle.is_empty() {
            return Ok(Self::Unsubmitted);
        }

        match handle.split_once(GROUP_SEPARATOR) {
            Some((job_id, group_id)) => Ok(Self::Grouped {
                job_id: parse_segment(handle, job_id, "job id")?,
                group_id: parse_segment(handle, group_id, "group id")?,
            }),
            None => Ok(Self::Legacy {
                job_id: parse_segment(handle, handle, "job id")?,
            }),
        }
    }

    pub fn job_id(&self) -> Option<i64> {
        match self {
            Self::Unsubmitted => None,
            Self::Legacy { job_id } | Self::Grouped { job_id, .. } => Some(*job_id),
        }
    }

    pub fn group_id(&self) -> Option<i64> {
        match self {
            Self::Grouped { group_id, .. } => Some(*group_id),
            _ => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}

fn parse_segment(handle: &str, segment: &str, what: &str) -> Result<i64, HandleError> {
    segment.parse::<i64>().map_err(|e| HandleError::Malformed {
        handle: handle.to_string(),
        reason: format!("{} '{}' is not an integer: {}", what, segment, e),
    })
}

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsubmitted => Ok(()),
            Self::Legacy { job_id } => write!(f, "{}", job_id),
            Self::Grouped { job_id, group_id } => {
                f.write_str(&Self::encode(*job_id, *group_id))
            }
        }
    }
}

impl FromStr for RemoteHandle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
