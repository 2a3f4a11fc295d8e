//! Machine abstraction
//!
//! A machine knows how to script, submit, poll and kill jobs on one kind of
//! backend. [`CloudMachine`] drives the asynchronous remote compute backend.

use async_trait::async_trait;
use cirrus_client::BackendClient;
use cirrus_core::{Job, LifecycleState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::archive::Archiver;
use crate::config::Config;
use crate::error::{DispatchError, Result};
use crate::service::{LifecycleMonitor, ResultRetriever, SubmissionBuilder};
use crate::session::Session;

/// Exit code reported when the backend has none for a job
pub const MISSING_EXIT_CODE: i64 = -999;

const SCRIPT_HEADER: &str = "#!/bin/bash -l\n";

/// A job submission backend
#[async_trait]
pub trait Machine: Send + Sync {
    /// Renders the shell script executed for the job
    fn gen_script(&self, job: &Job) -> String;

    /// Submits the job and returns its remote handle
    async fn submit(&self, job: &mut Job, session: &mut Session) -> Result<String>;

    /// Polls the job's lifecycle state
    async fn poll(&self, job: &Job, session: &mut Session) -> Result<LifecycleState>;

    /// Asks the backend to kill the job
    async fn kill(&self, job: &Job) -> Result<()>;
}

/// Machine for the asynchronous remote compute backend
pub struct CloudMachine {
    config: Arc<Config>,
    client: Arc<dyn BackendClient>,
    local_root: PathBuf,
    submission: SubmissionBuilder,
    monitor: LifecycleMonitor,
}

impl CloudMachine {
    /// Creates a machine
    ///
    /// # Arguments
    /// * `config` - Validated machine configuration
    /// * `client` - Transport to the backend
    /// * `archiver` - Unpacks downloaded result archives
    /// * `local_root` - Local work directory of the submission
    pub fn new(
        config: Config,
        client: Arc<dyn BackendClient>,
        archiver: Arc<dyn Archiver>,
        local_root: impl Into<PathBuf>,
    ) -> Self {
        let config = Arc::new(config);
        let local_root = local_root.into();
        let retriever = ResultRetriever::new(Arc::clone(&client), archiver, local_root.clone());

        Self {
            submission: SubmissionBuilder::new(Arc::clone(&client), Arc::clone(&config)),
            monitor: LifecycleMonitor::new(Arc::clone(&client), Arc::clone(&config), retriever),
            config,
            client,
            local_root,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    /// Writes the job script into the local root
    pub async fn write_script(&self, job: &Job) -> Result<PathBuf> {
        let path = self.local_root.join(&job.script_file_name);
        tokio::fs::write(&path, self.gen_script(job)).await?;
        debug!("Wrote script for job {} to {}", job.job_hash, path.display());
        Ok(path)
    }

    /// Reports whether the job's finish tag came back with the results
    pub fn check_finish_tag(&self, job: &Job) -> bool {
        let tag = self.local_root.join(job.finish_tag_name());
        let finished = tag.exists();
        debug!("Finish tag {} present: {}", tag.display(), finished);
        finished
    }

    /// Returns the backend-reported exit code of a job
    ///
    /// Fails with [`DispatchError::InvalidJobId`] before any backend call when
    /// the handle does not carry a positive job id.
    pub async fn exit_code(&self, job: &Job, session: &Session) -> Result<i64> {
        let job_id = positive_job_id(job)?;
        let detail = self.client.job_detail(job_id, session.group_id()).await?;
        Ok(detail.exit_code().unwrap_or(MISSING_EXIT_CODE))
    }
}

/// Single-quotes a word for bash
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', "'\\''"))
}

fn positive_job_id(job: &Job) -> Result<i64> {
    job.handle()
        .ok()
        .and_then(|handle| handle.job_id())
        .filter(|id| *id > 0)
        .ok_or_else(|| DispatchError::InvalidJobId(job.remote_handle.clone()))
}

#[async_trait]
impl Machine for CloudMachine {
    fn gen_script(&self, job: &Job) -> String {
        let mut script = String::from(SCRIPT_HEADER);
        for task in &job.tasks {
            script.push_str(&format!(
                "cd {} || exit 1\n{} 1>>{} 2>>{} || exit $?\ncd - >/dev/null\n",
                shell_quote(&task.work_path),
                task.command,
                shell_quote(&task.outlog),
                shell_quote(&task.errlog)
            ));
        }
        script.push_str(&format!("touch {}\n", shell_quote(&job.finish_tag_name())));
        script
    }

    async fn submit(&self, job: &mut Job, session: &mut Session) -> Result<String> {
        self.write_script(job).await?;
        self.submission.submit(job, session).await
    }

    async fn poll(&self, job: &Job, session: &mut Session) -> Result<LifecycleState> {
        self.monitor.poll(job, session).await
    }

    async fn kill(&self, job: &Job) -> Result<()> {
        let Some(job_id) = job.handle()?.job_id() else {
            warn!("Job {} was never submitted, nothing to kill", job.job_hash);
            return Ok(());
        };

        self.client.kill(job_id).await?;
        info!("Kill requested for job {}", job.remote_handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, RecordingArchiver, test_config};
    use cirrus_core::Task;
    use serde_json::json;
    use tempfile::TempDir;

    fn machine(mock: &Arc<MockBackend>, root: &TempDir) -> CloudMachine {
        CloudMachine::new(
            test_config(),
            mock.clone(),
            Arc::new(RecordingArchiver::default()),
            root.path(),
        )
    }

    fn job_with_handle(handle: &str) -> Job {
        let mut job = Job::new("beef07", vec![Task::new("task.000", "run")]);
        job.remote_handle = handle.to_string();
        job
    }

    #[test]
    fn test_gen_script() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new());
        let job = Job::new(
            "beef07",
            vec![
                Task::new("task.000", "python run.py"),
                Task::new("task.001", "python run.py").with_outlog("out.log"),
            ],
        );

        let script = machine(&mock, &root).gen_script(&job);

        assert!(script.starts_with("#!/bin/bash -l\n"));
        assert!(script.contains(
            "cd 'task.000' || exit 1\npython run.py 1>>'log' 2>>'err' || exit $?\n"
        ));
        assert!(script.contains(
            "cd 'task.001' || exit 1\npython run.py 1>>'out.log' 2>>'err' || exit $?\n"
        ));
        assert!(script.ends_with("cd - >/dev/null\ntouch 'beef07_job_tag_finished'\n"));
    }

    #[test]
    fn test_gen_script_quotes_work_paths() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new());
        let job = Job::new("beef07", vec![Task::new("my task's dir", "run")]);

        let script = machine(&mock, &root).gen_script(&job);

        assert!(script.contains("cd 'my task'\\''s dir' || exit 1\n"));
    }

    #[test]
    fn test_check_finish_tag() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new());
        let machine = machine(&mock, &root);
        let job = job_with_handle("12:job_group_id:5");

        assert!(!machine.check_finish_tag(&job));
        std::fs::write(root.path().join("beef07_job_tag_finished"), b"").unwrap();
        assert!(machine.check_finish_tag(&job));
    }

    #[tokio::test]
    async fn test_submit_writes_script() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new().with_created(9, 1));
        let machine = machine(&mock, &root);
        let mut job = Job::new("beef07", vec![Task::new("task.000", "run")]);

        let handle = machine.submit(&mut job, &mut Session::new()).await.unwrap();

        assert_eq!(handle, "9:job_group_id:1");
        let script = std::fs::read_to_string(root.path().join("beef07.sub")).unwrap();
        assert!(script.starts_with("#!/bin/bash -l"));
        assert_eq!(
            mock.create_calls.lock().unwrap()[0].payload.command,
            "bash beef07.sub"
        );
    }

    #[tokio::test]
    async fn test_exit_code_rejects_non_positive_id_before_backend_call() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new().with_details(vec![json!({ "exitCode": 3 })]));
        let machine = machine(&mock, &root);

        for handle in ["", "0:job_group_id:5", "-4:job_group_id:5", "abc"] {
            let err = machine
                .exit_code(&job_with_handle(handle), &Session::new())
                .await
                .unwrap_err();
            assert!(matches!(err, DispatchError::InvalidJobId(_)), "{}", handle);
        }
        assert_eq!(mock.detail_count(), 0);
    }

    #[tokio::test]
    async fn test_exit_code_reported_or_sentinel() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(
            MockBackend::new().with_details(vec![
                json!({ "status": 2, "exitCode": 3 }),
                json!({ "status": 2 }),
            ]),
        );
        let machine = machine(&mock, &root);
        let job = job_with_handle("12:job_group_id:5");
        let session = Session::with_group(5);

        assert_eq!(machine.exit_code(&job, &session).await.unwrap(), 3);
        assert_eq!(
            machine.exit_code(&job, &session).await.unwrap(),
            MISSING_EXIT_CODE
        );
        assert_eq!(
            *mock.detail_calls.lock().unwrap(),
            vec![(12, Some(5)), (12, Some(5))]
        );
    }

    #[tokio::test]
    async fn test_kill_forwards_numeric_id() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new());
        let machine = machine(&mock, &root);
        let job = job_with_handle("12:job_group_id:5");

        machine.kill(&job).await.unwrap();

        assert_eq!(*mock.kill_calls.lock().unwrap(), vec![12]);
        assert_eq!(job.state, LifecycleState::Unsubmitted);
    }

    #[tokio::test]
    async fn test_kill_unsubmitted_is_a_no_op() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new());

        machine(&mock, &root)
            .kill(&job_with_handle(""))
            .await
            .unwrap();

        assert!(mock.kill_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_through_machine() {
        let root = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::new().with_details(vec![json!({ "status": 9 })]));
        let machine: Box<dyn Machine> = Box::new(machine(&mock, &root));

        let state = machine
            .poll(&job_with_handle("12:job_group_id:5"), &mut Session::new())
            .await
            .unwrap();

        assert_eq!(state, LifecycleState::Waiting);
    }
}
