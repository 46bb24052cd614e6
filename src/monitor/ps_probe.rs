use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::probe::{ProcessProbe, matches_process_name};
use crate::error::{PilotError, Result};

/// Reads the process table through the platform listing tool
/// (`ps` on Unix, `tasklist` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct PsProbe;

impl PsProbe {
    async fn run(program: &str, args: &[&str]) -> Result<String> {
        debug!(program, args = ?args, "Listing processes");

        let output: Output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| PilotError::Probe(format!("{program}: {e}")))?;

        if !output.status.success() {
            return Err(PilotError::Probe(format!(
                "{program} exited with {}",
                output.status
            )));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(PilotError::Probe(format!("{program}: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ProcessProbe for PsProbe {
    fn name(&self) -> &'static str {
        "ps"
    }

    #[cfg(not(windows))]
    async fn is_running(&self, process_name: &str) -> Result<bool> {
        let listing = Self::run("ps", &["-eo", "pid=,stat=,args="]).await?;
        ps_listing_contains(&listing, process_name, std::process::id())
    }

    #[cfg(windows)]
    async fn is_running(&self, process_name: &str) -> Result<bool> {
        let listing = Self::run("tasklist", &["/FO", "CSV", "/NH"]).await?;
        tasklist_contains(&listing, process_name, std::process::id())
    }
}

/// Scan `ps -eo pid=,stat=,args=` output. Zombies and `own_pid` are skipped.
pub fn ps_listing_contains(listing: &str, process_name: &str, own_pid: u32) -> Result<bool> {
    let mut rows = 0usize;
    for line in listing.lines() {
        let mut fields = line.split_whitespace();
        let (Some(pid), Some(stat)) = (fields.next(), fields.next()) else {
            continue;
        };
        rows += 1;
        if pid.parse::<u32>().ok() == Some(own_pid) || stat.starts_with('Z') {
            continue;
        }
        // argv[0], or the script run by an interpreter
        if fields.take(2).any(|token| matches_process_name(token, process_name)) {
            return Ok(true);
        }
    }
    if rows == 0 {
        return Err(PilotError::Probe("empty process listing".into()));
    }
    Ok(false)
}

/// Scan `tasklist /FO CSV /NH` output: `"image","pid","session","#","mem"`.
pub fn tasklist_contains(listing: &str, process_name: &str, own_pid: u32) -> Result<bool> {
    let mut rows = 0usize;
    for line in listing.lines() {
        let fields: Vec<&str> = line
            .split("\",\"")
            .map(|f| f.trim().trim_matches('"'))
            .collect();
        let [image, pid, ..] = fields.as_slice() else {
            continue;
        };
        rows += 1;
        if pid.parse::<u32>().ok() == Some(own_pid) {
            continue;
        }
        if matches_process_name(image, process_name) {
            return Ok(true);
        }
    }
    if rows == 0 {
        return Err(PilotError::Probe("empty process listing".into()));
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS: &str = "\
    1 Ss   /sbin/init splash
  812 Sl   /usr/bin/python3 /home/farm/chia-blockchain/venv/bin/chia plots create -k 32
  900 Z    [chia] <defunct>
  950 S    plot-pilot run --config /home/farm/chia/config.yaml
";

    #[test]
    fn test_ps_finds_worker_by_token() {
        assert!(ps_listing_contains(PS, "chia", 950).unwrap());
    }

    #[test]
    fn test_ps_skips_zombies_and_self() {
        let listing = "\
  900 Z    [chia] <defunct>
  950 S    chia-watch chia
    1 Ss   /sbin/init
";
        assert!(!ps_listing_contains(listing, "chia", 950).unwrap());
    }

    #[test]
    fn test_ps_not_fooled_by_paths_containing_name() {
        let listing = "  950 S    plot-pilot run --config /home/farm/chia/config.yaml\n";
        assert!(!ps_listing_contains(listing, "chia", 1).unwrap());
    }

    #[test]
    fn test_ps_ignores_name_in_later_arguments() {
        let listing = "  950 S    tail -f /var/log/chia\n";
        assert!(!ps_listing_contains(listing, "chia", 1).unwrap());
    }

    #[test]
    fn test_ps_empty_listing_is_error() {
        assert!(ps_listing_contains("", "chia", 1).is_err());
        assert!(ps_listing_contains("\n\n", "chia", 1).is_err());
    }

    #[test]
    fn test_tasklist_parsing() {
        let listing = "\
\"System Idle Process\",\"0\",\"Services\",\"0\",\"8 K\"\r
\"chia.exe\",\"4312\",\"Console\",\"1\",\"152,044 K\"\r
";
        assert!(tasklist_contains(listing, "chia.exe", 1).unwrap());
        assert!(!tasklist_contains(listing, "chia.exe", 4312).unwrap());
        assert!(!tasklist_contains(listing, "plotter.exe", 1).unwrap());
        assert!(tasklist_contains("", "chia.exe", 1).is_err());
    }
}
