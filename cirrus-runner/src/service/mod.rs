//! Service layer
//!
//! Services contain the job lifecycle logic of the runner. They talk to the
//! backend through the [`BackendClient`](cirrus_client::BackendClient) seam
//! and never own the job records they operate on.

mod monitor;
mod retrieval;
mod submission;

pub use monitor::{LifecycleMonitor, MISSING_STATUS_COOLDOWN};
pub use retrieval::{BACKUP_DIR, ResultRetriever};
pub use submission::SubmissionBuilder;
