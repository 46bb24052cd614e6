use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{PilotError, Result};

const RECORD_LEN: usize = 4;
/// Records written by older 64-bit builds used the host word size.
const LEGACY_RECORD_LEN: usize = 8;

/// Durable rotation position: a single 4-byte little-endian index.
pub struct RotationStore {
    path: PathBuf,
}

impl RotationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the persisted index, creating the record with `default` when it
    /// does not exist yet. The flag is `true` when a record was found.
    pub async fn load_or_init(&self, default: usize) -> Result<(usize, bool)> {
        self.recover_interrupted_writes().await;

        if let Some(index) = self.peek().await? {
            debug!(index, path = %self.path.display(), "Resuming rotation");
            return Ok((index, true));
        }

        self.store(default).await?;
        info!(index = default, path = %self.path.display(), "Created rotation state");
        Ok((default, false))
    }

    /// Read the persisted index without creating anything.
    pub async fn peek(&self) -> Result<Option<usize>> {
        match fs::read(&self.path).await {
            Ok(bytes) => decode_index(&bytes)
                .map(Some)
                .ok_or_else(|| PilotError::StateCorrupted {
                    path: self.path.clone(),
                    len: bytes.len(),
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn store(&self, index: usize) -> Result<()> {
        let bytes = encode_index(index)?;
        self.write_atomic(&bytes)
            .await
            .map_err(|e| PilotError::StatePersistence(format!("{}: {e}", self.path.display())))
    }

    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Rotation state removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PilotError::StatePersistence(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_atomic(&self, bytes: &[u8]) -> std::io::Result<()> {
        let tmp_path = self.temp_path();

        // 1. Write to temp file
        fs::write(&tmp_path, bytes).await?;

        // 2. Flush to stable storage before it can replace the record
        let tmp = tmp_path.clone();
        tokio::task::spawn_blocking(move || std::fs::File::open(&tmp)?.sync_all())
            .await
            .map_err(std::io::Error::other)??;

        // 3. Atomic rename
        fs::rename(&tmp_path, &self.path).await?;

        // 4. Persist the rename itself
        #[cfg(unix)]
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir = dir.to_path_buf();
            tokio::task::spawn_blocking(move || std::fs::File::open(&dir)?.sync_all())
                .await
                .map_err(std::io::Error::other)??;
        }

        Ok(())
    }

    async fn recover_interrupted_writes(&self) {
        let tmp_path = self.temp_path();
        if fs::try_exists(&tmp_path).await.unwrap_or(false) {
            debug!(path = %tmp_path.display(), "Removing interrupted write");
            if let Err(e) = fs::remove_file(&tmp_path).await {
                warn!(path = %tmp_path.display(), error = %e, "Failed to remove interrupted write");
            }
        }
    }
}

fn encode_index(index: usize) -> Result<[u8; RECORD_LEN]> {
    u32::try_from(index)
        .map(u32::to_le_bytes)
        .map_err(|_| PilotError::StatePersistence(format!("index {index} exceeds record width")))
}

fn decode_index(bytes: &[u8]) -> Option<usize> {
    match bytes.len() {
        RECORD_LEN => {
            let raw: [u8; RECORD_LEN] = bytes.try_into().ok()?;
            usize::try_from(u32::from_le_bytes(raw)).ok()
        }
        LEGACY_RECORD_LEN => {
            let raw: [u8; LEGACY_RECORD_LEN] = bytes.try_into().ok()?;
            usize::try_from(i64::from_le_bytes(raw)).ok()
        }
        _ => None,
    }
}
