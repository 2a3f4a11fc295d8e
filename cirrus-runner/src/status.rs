//! Backend status translation
//!
//! Maps raw backend status codes onto [`LifecycleState`]. Translation never
//! fails: codes outside the table become `Unknown` so that monitoring can
//! continue while an operator inspects the anomaly.

use cirrus_core::LifecycleState;
use cirrus_core::dto::job::ReportedStatus;
use serde_json::Value;
use tracing::error;

/// Status as reported by the backend, or one that was already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Code(i64),
    /// Non-integral status value, always `Unknown`
    Unrecognized(Value),
    Normalized(LifecycleState),
}

impl From<ReportedStatus> for BackendStatus {
    fn from(status: ReportedStatus) -> Self {
        match status {
            ReportedStatus::Code(code) => Self::Code(code),
            ReportedStatus::Unrecognized(value) => Self::Unrecognized(value),
        }
    }
}

impl From<i64> for BackendStatus {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

impl From<LifecycleState> for BackendStatus {
    fn from(state: LifecycleState) -> Self {
        Self::Normalized(state)
    }
}

/// Backend code for a terminated job
const TERMINATED: i64 = -1;

fn lookup(code: i64) -> Option<LifecycleState> {
    let state = match code {
        -1 => LifecycleState::Terminated,
        0 => LifecycleState::Waiting,
        1 => LifecycleState::Running,
        2 => LifecycleState::Finished,
        3 => LifecycleState::Waiting,
        4 => LifecycleState::Running,
        5 => LifecycleState::Terminated,
        6 => LifecycleState::Running,
        9 => LifecycleState::Waiting,
        _ => return None,
    };
    Some(state)
}

/// Translates a backend status into a lifecycle state
///
/// Some environments report any nonzero exit as terminated even when the job
/// logic completed. With `ignore_exit_code` set, a terminated job with a
/// nonzero exit code is therefore reported as finished.
pub fn translate(
    status: impl Into<BackendStatus>,
    exit_code: i64,
    ignore_exit_code: bool,
) -> LifecycleState {
    let code = match status.into() {
        BackendStatus::Normalized(state) => return state,
        BackendStatus::Code(code) => code,
        BackendStatus::Unrecognized(value) => {
            error!("Unknown job status {} from backend", value);
            return LifecycleState::Unknown;
        }
    };

    let Some(state) = lookup(code) else {
        error!("Unknown job status {} from backend", code);
        return LifecycleState::Unknown;
    };

    if code == TERMINATED && exit_code != 0 && ignore_exit_code {
        return LifecycleState::Finished;
    }

    state
}
