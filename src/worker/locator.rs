use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PilotError, Result};

#[cfg(windows)]
const WORKER_BINARY: &str = "chia.exe";
#[cfg(not(windows))]
const WORKER_BINARY: &str = "chia";

/// Resolve the worker executable from the install root.
///
/// Unix installs keep the binary directly under the root. The Windows GUI
/// installer nests it under the newest `app-<version>` directory.
pub fn locate_executable(run_path: &Path) -> Result<PathBuf> {
    let root = install_root(run_path)?;
    if !root.is_dir() {
        return Err(PilotError::InstallDirNotFound(root));
    }

    let daemon_dir = if cfg!(windows) {
        windows_daemon_dir(&root)?
    } else {
        root
    };

    let executable = daemon_dir.join(WORKER_BINARY);
    if !executable.is_file() {
        return Err(PilotError::WorkerNotFound(executable));
    }
    debug!(executable = %executable.display(), "Located worker executable");
    Ok(executable)
}

fn install_root(run_path: &Path) -> Result<PathBuf> {
    if !run_path.as_os_str().is_empty() {
        return Ok(run_path.to_path_buf());
    }
    if cfg!(windows) {
        let local = std::env::var_os("LOCALAPPDATA")
            .ok_or_else(|| PilotError::Config("RunPath is empty and LOCALAPPDATA is unset".into()))?;
        return Ok(PathBuf::from(local).join("chia-blockchain"));
    }
    Err(PilotError::Config("RunPath must be set".into()))
}

/// `<root>/app-<newest>/resources/app.asar.unpacked/daemon`.
pub fn windows_daemon_dir(root: &Path) -> Result<PathBuf> {
    let mut versions: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("app-"))
        .collect();

    versions.sort_by_key(|name| version_key(name));
    let newest = versions
        .pop()
        .ok_or_else(|| PilotError::InstallDirNotFound(root.join("app-*")))?;

    Ok(root
        .join(newest)
        .join("resources")
        .join("app.asar.unpacked")
        .join("daemon"))
}

/// `app-1.10.2` sorts after `app-1.9.0`; non-numeric parts sort as zero.
fn version_key(name: &str) -> Vec<u64> {
    name.trim_start_matches("app-")
        .split(['.', '-'])
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_version_ordering() {
        assert!(version_key("app-1.10.2") > version_key("app-1.9.0"));
        assert!(version_key("app-1.1.7") > version_key("app-1.1"));
    }

    #[test]
    fn test_windows_layout_picks_newest() {
        let dir = TempDir::new().unwrap();
        for name in ["app-1.1.5", "app-1.10.0", "app-1.9.3", "packages"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }

        let daemon = windows_daemon_dir(dir.path()).unwrap();
        assert!(daemon.starts_with(dir.path().join("app-1.10.0")));
        assert!(daemon.ends_with("resources/app.asar.unpacked/daemon"));
    }

    #[test]
    fn test_windows_layout_without_versions() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            windows_daemon_dir(dir.path()),
            Err(PilotError::InstallDirNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_unix_binary() {
        let dir = TempDir::new().unwrap();
        let missing = locate_executable(dir.path()).unwrap_err();
        assert!(matches!(missing, PilotError::WorkerNotFound(_)));

        std::fs::write(dir.path().join("chia"), b"#!/bin/sh\n").unwrap();
        assert_eq!(locate_executable(dir.path()).unwrap(), dir.path().join("chia"));
    }

    #[test]
    fn test_missing_install_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            locate_executable(&dir.path().join("nope")),
            Err(PilotError::InstallDirNotFound(_))
        ));
    }
}
