use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid destination {}: {reason}", path.display())]
    InvalidDestination { path: PathBuf, reason: String },

    #[error("Temp workspace is not a directory: {}", .0.display())]
    TempWorkspace(PathBuf),

    #[error("Worker install directory not found: {}", .0.display())]
    InstallDirNotFound(PathBuf),

    #[error("Worker executable not found: {}", .0.display())]
    WorkerNotFound(PathBuf),

    #[error("Farmer and pool keys are required (configure FarmerKey/PoolKey or import keys into the worker)")]
    CredentialsMissing,

    #[error("Credential extraction failed: {0}")]
    CredentialExtraction(String),

    #[error("State persistence failed: {0}")]
    StatePersistence(String),

    #[error("Rotation state at {} is corrupted ({len} bytes)", path.display())]
    StateCorrupted { path: PathBuf, len: usize },

    #[error("Persisted rotation index {index} is out of range for {len} destinations")]
    StateOutOfRange { index: usize, len: usize },

    #[error("No destinations configured")]
    NoDestinations,

    #[error("No worker could be started for destination {}", .0.display())]
    BatchLaunchFailed(PathBuf),

    #[error("Process probe failed: {0}")]
    Probe(String),

    #[error("Invalid state transition: {from} → {to} (allowed: {allowed})")]
    InvalidStateTransition {
        from: String,
        to: String,
        allowed: String,
    },

    #[error("Interrupted before the rotation was exhausted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl PilotError {
    /// Failures writing or removing the rotation record. The supervisor keeps
    /// its in-memory phase unchanged when one of these is returned.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::StatePersistence(_))
    }

    /// Misconfiguration detected before the rotation starts.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigNotFound(_)
                | Self::InvalidDestination { .. }
                | Self::TempWorkspace(_)
                | Self::InstallDirNotFound(_)
                | Self::WorkerNotFound(_)
                | Self::CredentialsMissing
                | Self::CredentialExtraction(_)
                | Self::StateCorrupted { .. }
                | Self::StateOutOfRange { .. }
                | Self::NoDestinations
        )
    }
}

pub type Result<T> = std::result::Result<T, PilotError>;
