use async_trait::async_trait;
use sysinfo::{Process, ProcessStatus, System};

use super::probe::{ProcessProbe, matches_process_name};
use crate::error::{PilotError, Result};

/// In-process enumeration through `sysinfo`; works on Linux, macOS and Windows
/// without shelling out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoProbe;

#[async_trait]
impl ProcessProbe for SysinfoProbe {
    fn name(&self) -> &'static str {
        "sysinfo"
    }

    async fn is_running(&self, process_name: &str) -> Result<bool> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(PilotError::Probe(
                "process enumeration is not supported on this platform".into(),
            ));
        }

        let wanted = process_name.to_string();
        let own_pid = std::process::id();

        tokio::task::spawn_blocking(move || {
            let sys = System::new_all();
            let processes = sys.processes();
            if processes.is_empty() {
                return Err(PilotError::Probe("empty process table".into()));
            }
            Ok(processes
                .values()
                .any(|p| p.pid().as_u32() != own_pid && is_worker(p, &wanted)))
        })
        .await
        .map_err(|e| PilotError::Probe(e.to_string()))?
    }
}

fn is_worker(process: &Process, wanted: &str) -> bool {
    if matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead) {
        return false;
    }
    matches_process_name(&process.name().to_string_lossy(), wanted)
        || process
            .cmd()
            .iter()
            // argv[0], or the script run by an interpreter
            .take(2)
            .any(|arg| matches_process_name(&arg.to_string_lossy(), wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finds_no_nonexistent_worker() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let running = SysinfoProbe
            .is_running("definitely-not-a-real-worker-4711")
            .await
            .unwrap();
        assert!(!running);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_finds_live_child() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let mut child = tokio::process::Command::new("sleep")
            .arg("5")
            .spawn()
            .unwrap();

        let running = SysinfoProbe.is_running("sleep").await.unwrap();
        child.kill().await.unwrap();
        assert!(running);
    }
}
