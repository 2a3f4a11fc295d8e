//! Result retrieval service
//!
//! Downloads the result archive of a finished job, unpacks it into the
//! local root and keeps the raw download under `backup/` for audit.

use anyhow::Context;
use cirrus_client::BackendClient;
use cirrus_core::Job;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::archive::Archiver;
use crate::error::Result;

/// Subdirectory of the local root holding downloaded archives
pub const BACKUP_DIR: &str = "backup";

/// Retrieves and unpacks job results
pub struct ResultRetriever {
    client: Arc<dyn BackendClient>,
    archiver: Arc<dyn Archiver>,
    local_root: PathBuf,
}

impl ResultRetriever {
    pub fn new(
        client: Arc<dyn BackendClient>,
        archiver: Arc<dyn Archiver>,
        local_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            archiver,
            local_root: local_root.into(),
        }
    }

    /// Downloads and unpacks the job's result archive
    ///
    /// A job without a result URL is left untouched. Failing to move the
    /// archive into `backup/` is logged and otherwise ignored.
    pub async fn retrieve(&self, job: &Job) -> Result<()> {
        let url = match self.client.result_url(&job.remote_handle).await? {
            Some(url) if !url.is_empty() => url,
            _ => {
                info!("No result archive available for job {}", job.remote_handle);
                return Ok(());
            }
        };

        let archive_name = job.result_archive_name();
        let archive = self.local_root.join(&archive_name);
        self.client.download(&url, &archive).await?;
        info!(
            "Downloaded results of job {} to {}",
            job.remote_handle,
            archive.display()
        );

        self.archiver
            .unpack(&archive, &self.local_root)
            .with_context(|| format!("Failed to unpack result archive {}", archive.display()))?;

        if let Err(e) = self.backup(&archive, &archive_name).await {
            error!("Unable to backup file {}: {}", archive.display(), e);
        }

        Ok(())
    }

    async fn backup(&self, archive: &Path, archive_name: &str) -> std::io::Result<()> {
        let backup_dir = self.local_root.join(BACKUP_DIR);
        tokio::fs::create_dir_all(&backup_dir).await?;
        tokio::fs::rename(archive, backup_dir.join(archive_name)).await
    }
}
