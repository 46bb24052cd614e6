use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{info, warn};

use super::command::WorkerCommand;
use super::logs::log_file_path;
use super::spawner::Spawner;
use crate::clock::SharedClock;
use crate::error::{PilotError, Result};
use crate::supervisor::ShutdownSignal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub destination: PathBuf,
    pub spawned: u32,
    pub failed: u32,
}

/// Launches one batch of workers per destination: `total` workers for every
/// temp workspace, one launch every `stagger`.
pub struct BatchLauncher {
    command: WorkerCommand,
    workspaces: Vec<PathBuf>,
    total: u32,
    stagger: Duration,
    log_dir: PathBuf,
    spawner: Arc<dyn Spawner>,
    clock: SharedClock,
}

impl BatchLauncher {
    pub fn new(
        command: WorkerCommand,
        workspaces: Vec<PathBuf>,
        total: u32,
        stagger: Duration,
        log_dir: impl Into<PathBuf>,
        spawner: Arc<dyn Spawner>,
        clock: SharedClock,
    ) -> Self {
        Self {
            command,
            workspaces,
            total,
            stagger,
            log_dir: log_dir.into(),
            spawner,
            clock,
        }
    }

    pub fn workers_per_batch(&self) -> u32 {
        self.total * self.workspaces.len() as u32
    }

    /// Start every worker of the batch. Individual spawn failures are logged
    /// and skipped; a batch in which nothing started is an error. A stagger
    /// wait cut short by `shutdown` returns `Interrupted`.
    pub async fn launch(&self, destination: &Path, shutdown: &ShutdownSignal) -> Result<LaunchReport> {
        let mut report = LaunchReport {
            destination: destination.to_path_buf(),
            spawned: 0,
            failed: 0,
        };
        let planned = self.workers_per_batch();
        let mut launched = 0;

        info!(
            destination = %destination.display(),
            workers = planned,
            stagger_secs = self.stagger.as_secs(),
            "Launching batch"
        );

        for (workspace, temp_dir) in self.workspaces.iter().enumerate() {
            for i in 0..self.total {
                let date = Local::now().date_naive();
                let log_path = log_file_path(&self.log_dir, date, workspace, i);
                let invocation = self.command.build(temp_dir, destination, log_path);

                match self.spawner.spawn(&invocation) {
                    Ok(pid) => {
                        report.spawned += 1;
                        info!(
                            pid = ?pid,
                            temp = %temp_dir.display(),
                            log = %invocation.log_path.display(),
                            "Started worker {}/{}",
                            launched + 1,
                            planned
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(
                            command = %invocation.display_line(),
                            error = %e,
                            "Failed to start worker"
                        );
                    }
                }

                launched += 1;
                if launched < planned && !self.stagger.is_zero() {
                    tokio::select! {
                        _ = self.clock.sleep(self.stagger) => {}
                        _ = shutdown.wait() => {
                            warn!(
                                destination = %destination.display(),
                                spawned = report.spawned,
                                planned,
                                "Batch launch interrupted"
                            );
                            return Err(PilotError::Interrupted);
                        }
                    }
                }
            }
        }

        if report.spawned == 0 && planned > 0 {
            return Err(PilotError::BatchLaunchFailed(destination.to_path_buf()));
        }

        info!(
            destination = %destination.display(),
            spawned = report.spawned,
            failed = report.failed,
            "Batch launched"
        );
        Ok(report)
    }
}
