use std::fs::OpenOptions;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::command::WorkerInvocation;
use crate::error::Result;

/// Starts a worker and forgets about it.
///
/// Implementations must not keep a handle or wait for the child: completion is
/// observed through the process table so that the supervisor can restart
/// independently of its workers.
pub trait Spawner: Send + Sync {
    /// Returns the OS process id when the platform reports one.
    fn spawn(&self, invocation: &WorkerInvocation) -> Result<Option<u32>>;
}

/// Spawns workers in their own process group with output appended to the log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedSpawner;

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

impl Spawner for DetachedSpawner {
    fn spawn(&self, invocation: &WorkerInvocation) -> Result<Option<u32>> {
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&invocation.log_path)?;
        let stderr = stdout.try_clone()?;

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(false);

        // Own process group: a Ctrl-C aimed at the supervisor's terminal
        // group does not reach the workers.
        #[cfg(unix)]
        cmd.process_group(0);

        #[cfg(windows)]
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);

        // The child handle is dropped right away; tokio reaps the exit status
        // in the background so finished workers do not linger as zombies.
        let child = cmd.spawn()?;
        let pid = child.id();
        debug!(pid = ?pid, log = %invocation.log_path.display(), "Worker detached");
        Ok(pid)
    }
}
