//! Background filesystem work: folder listings and recursive config scans.
//!
//! Each job runs on the blocking pool under a timeout and reports back to
//! the event loop as a single [`Event`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::{AppError, Result};
use crate::event::Event;
use crate::fs::backend::Backend;
use crate::fs::filter::ScanMode;

/// Work requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// List one level of a managed folder.
    LoadChildren(PathBuf),
    /// Recursively collect config files under a folder for import.
    ScanConfigs(PathBuf),
}

/// Runs jobs against a backend with the configured limits.
#[derive(Clone)]
pub struct JobRunner {
    backend: Arc<dyn Backend>,
    timeout: Duration,
    dirs_first: bool,
    max_depth: usize,
    mode: ScanMode,
}

impl JobRunner {
    pub fn new(
        backend: Arc<dyn Backend>,
        timeout: Duration,
        dirs_first: bool,
        max_depth: usize,
        mode: ScanMode,
    ) -> Self {
        Self {
            backend,
            timeout,
            dirs_first,
            max_depth,
            mode,
        }
    }

    /// Execute a job to completion.
    pub async fn run(&self, job: Job) -> Event {
        match job {
            Job::LoadChildren(path) => {
                let backend = Arc::clone(&self.backend);
                let dir = path.clone();
                let dirs_first = self.dirs_first;
                let result = self
                    .blocking(move || backend.list_children(&dir, dirs_first))
                    .await;
                Event::ChildrenLoaded { path, result }
            }
            Job::ScanConfigs(root) => {
                let backend = Arc::clone(&self.backend);
                let dir = root.clone();
                let (max_depth, mode) = (self.max_depth, self.mode);
                let result = self
                    .blocking(move || backend.scan_config_files(&dir, max_depth, mode))
                    .await;
                Event::ScanFinished { root, result }
            }
        }
    }

    /// Run the job on the runtime and send its result to the event loop.
    pub fn spawn(&self, job: Job, tx: UnboundedSender<Event>) {
        tracing::debug!(?job, "spawning job");
        let runner = self.clone();
        tokio::spawn(async move {
            let event = runner.run(job).await;
            let _ = tx.send(event);
        });
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(f)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AppError::Scan(format!("scan worker failed: {}", join_err))),
            Err(_) => Err(AppError::Scan(format!(
                "timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
