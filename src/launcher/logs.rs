use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tracing::{debug, warn};

/// `<YYYYMMDD>_<i>.log` for the primary workspace, `<YYYYMMDD>_<n>_<i>.log`
/// for workspace `n` (1-based) beyond the first.
pub fn log_file_name(date: NaiveDate, workspace: usize, sequence: u32) -> String {
    let day = date.format("%Y%m%d");
    if workspace == 0 {
        format!("{day}_{sequence}.log")
    } else {
        format!("{day}_{}_{sequence}.log", workspace + 1)
    }
}

pub fn log_file_path(log_dir: &Path, date: NaiveDate, workspace: usize, sequence: u32) -> PathBuf {
    log_dir.join(log_file_name(date, workspace, sequence))
}

/// Remove everything inside `log_dir`, keeping the directory itself.
/// Failures are logged and skipped; returns how many entries were removed.
pub async fn clear_log_dir(log_dir: &Path) -> usize {
    let mut entries = match fs::read_dir(log_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!(dir = %log_dir.display(), error = %e, "Failed to read log directory");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %log_dir.display(), error = %e, "Failed to list log directory");
                break;
            }
        };
        let path = entry.path();
        let result = match entry.file_type().await {
            Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path).await,
            _ => fs::remove_file(&path).await,
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove log entry"),
        }
    }

    debug!(dir = %log_dir.display(), removed, "Log directory cleared");
    removed
}
