//! Archive extraction seam
//!
//! The archive format is owned by the packaging side. The runner only needs
//! to unpack a downloaded result archive into the job's local root.

use std::path::Path;

/// Unpacks result archives
pub trait Archiver: Send + Sync {
    /// Extracts `archive` into `dest`
    fn unpack(&self, archive: &Path, dest: &Path) -> anyhow::Result<()>;
}
