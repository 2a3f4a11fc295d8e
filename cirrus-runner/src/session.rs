//! Machine session state
//!
//! The only state shared across jobs of one machine session is the active
//! backend group. Submission writes it when grouping is enabled; the monitor
//! reads it and adopts the group of a handle that disagrees with it, which
//! recovers the group after a process restart. Callers monitoring several
//! jobs concurrently must serialize access to the session.

/// Per-machine session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    group_id: Option<i64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session that resumes an existing group
    pub fn with_group(group_id: i64) -> Self {
        Self {
            group_id: Some(group_id),
        }
    }

    /// Group under which the next submission is co-scheduled
    pub fn group_id(&self) -> Option<i64> {
        self.group_id
    }

    pub fn adopt_group(&mut self, group_id: i64) {
        self.group_id = Some(group_id);
    }
}
