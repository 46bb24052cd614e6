use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tokio::fs;

use crate::error::{PilotError, Result};

/// Top-level configuration. Key names match the `config.yaml` files the
/// plotting rigs already use (`FinalPath`, `TempPath`, `Total`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PilotConfig {
    /// Use a pool contract address (`-c`) instead of a pool public key (`-p`).
    pub pool: bool,
    #[serde(deserialize_with = "text_or_integer")]
    pub num_plots: String,
    #[serde(deserialize_with = "text_or_integer")]
    pub k_size: String,
    #[serde(deserialize_with = "text_or_integer")]
    pub buffer: String,
    #[serde(deserialize_with = "text_or_integer")]
    pub threads: String,
    #[serde(deserialize_with = "text_or_integer")]
    pub buckets: String,
    pub temp_path: PathBuf,
    pub temp_path2: Option<PathBuf>,
    pub final_path: Vec<PathBuf>,
    /// Workers launched per temp workspace for each destination.
    pub total: u32,
    /// Seconds between consecutive worker launches.
    pub sleep: u64,
    /// Worker installation root.
    pub run_path: PathBuf,
    pub farmer_key: String,
    pub pool_key: String,
    pub scheduler: SchedulerConfig,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            pool: false,
            num_plots: String::from("1"),
            k_size: String::from("32"),
            buffer: String::from("3389"),
            threads: String::from("2"),
            buckets: String::new(),
            temp_path: PathBuf::new(),
            temp_path2: None,
            final_path: Vec::new(),
            total: 1,
            sleep: 60,
            run_path: PathBuf::new(),
            farmer_key: String::new(),
            pool_key: String::new(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl PilotConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PilotError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_bw::from_str(content)?)
    }

    /// Validate configuration values for consistency. Filesystem checks live in
    /// [`PilotConfig::validate_paths`].
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.final_path.is_empty() {
            errors.push("FinalPath must list at least one destination".into());
        }
        if self.total == 0 {
            errors.push("Total must be greater than 0".into());
        }
        if self.temp_path.as_os_str().is_empty() {
            errors.push("TempPath must be set".into());
        }
        for (key, value) in [
            ("NumPlots", &self.num_plots),
            ("KSize", &self.k_size),
            ("Buffer", &self.buffer),
            ("Threads", &self.threads),
        ] {
            if !is_positive_integer(value) {
                errors.push(format!("{key} must be a positive integer (got {value:?})"));
            }
        }
        if !self.buckets.is_empty() && !is_positive_integer(&self.buckets) {
            errors.push(format!(
                "Buckets must be a positive integer when set (got {:?})",
                self.buckets
            ));
        }

        let scheduler = &self.scheduler;
        if scheduler.tick_interval_secs == 0 {
            errors.push("Scheduler.TickIntervalSecs must be greater than 0".into());
        }
        if scheduler.max_persist_failures == 0 {
            errors.push("Scheduler.MaxPersistFailures must be greater than 0".into());
        }
        if scheduler.process_name.trim().is_empty() {
            errors.push("Scheduler.ProcessName must not be empty".into());
        }
        if scheduler.state_file.as_os_str().is_empty() {
            errors.push("Scheduler.StateFile must not be empty".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PilotError::Config(errors.join("; ")))
        }
    }

    /// Check the directories the rotation depends on. Returns the first problem
    /// found; each one needs operator action.
    pub fn validate_paths(&self) -> Result<()> {
        if self.final_path.is_empty() {
            return Err(PilotError::NoDestinations);
        }
        for dest in &self.final_path {
            check_destination(dest)?;
        }

        if !self.temp_path.is_dir() {
            return Err(PilotError::TempWorkspace(self.temp_path.clone()));
        }
        if let Some(secondary) = self.secondary_temp()
            && !secondary.is_dir()
        {
            return Err(PilotError::TempWorkspace(secondary.to_path_buf()));
        }
        // An empty RunPath falls back to the platform install location.
        if !self.run_path.as_os_str().is_empty() && !self.run_path.is_dir() {
            return Err(PilotError::InstallDirNotFound(self.run_path.clone()));
        }
        Ok(())
    }

    /// Secondary temp workspace, ignoring an empty `TempPath2` value.
    pub fn secondary_temp(&self) -> Option<&Path> {
        self.temp_path2
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn has_credentials(&self) -> bool {
        !self.farmer_key.is_empty() && !self.pool_key.is_empty()
    }
}

/// Tuning values are passed to the worker verbatim; accept both `KSize: 32`
/// and `KSize: "32"`. A bare `Buckets:` is the empty string.
fn text_or_integer<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => text,
        Some(Raw::Integer(n)) => n.to_string(),
        None => String::new(),
    })
}

fn is_positive_integer(value: &str) -> bool {
    value.trim().parse::<u64>().is_ok_and(|v| v > 0)
}

fn check_destination(path: &Path) -> Result<()> {
    let invalid = |reason: &str| PilotError::InvalidDestination {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let metadata = std::fs::metadata(path).map_err(|e| invalid(&e.to_string()))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory"));
    }
    // Permission bits say nothing about ownership or ACLs; try a real file.
    tempfile::Builder::new()
        .prefix(".plot-pilot-")
        .tempfile_in(path)
        .map_err(|e| invalid(&format!("not writable: {e}")))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// In-process enumeration through the `sysinfo` crate.
    #[default]
    Sysinfo,
    /// `ps` on Unix, `tasklist` on Windows.
    Ps,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumePolicy {
    /// Always launch a batch for the persisted destination on startup.
    #[default]
    Relaunch,
    /// Skip the startup launch when a resumed rotation finds workers running.
    Attach,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SchedulerConfig {
    pub tick_interval_secs: u64,
    /// Sustained absence required before a batch counts as finished.
    pub grace_period_secs: u64,
    pub process_name: String,
    pub probe: ProbeKind,
    pub resume_policy: ResumePolicy,
    /// Rotation record, relative to the config file directory unless absolute.
    pub state_file: PathBuf,
    pub log_dir: PathBuf,
    /// Consecutive persistence failures tolerated before the run aborts.
    pub max_persist_failures: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 3,
            grace_period_secs: 180,
            process_name: String::from(if cfg!(windows) { "chia.exe" } else { "chia" }),
            probe: ProbeKind::default(),
            resume_policy: ResumePolicy::default(),
            state_file: PathBuf::from("nb"),
            log_dir: PathBuf::from("log"),
            max_persist_failures: 3,
        }
    }
}

/// On-disk layout derived from the config file location.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub base_dir: PathBuf,
    pub state_file: PathBuf,
    pub log_dir: PathBuf,
}

impl RunPaths {
    pub fn new(config_path: &Path, config: &PilotConfig) -> Self {
        let base_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            state_file: base_dir.join(&config.scheduler.state_file),
            log_dir: base_dir.join(&config.scheduler.log_dir),
            base_dir,
        }
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.log_dir).await?;
        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Default config location: `config.yaml` next to the running executable.
pub fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("config.yaml")))
        .unwrap_or_else(|| PathBuf::from("config.yaml"))
}
