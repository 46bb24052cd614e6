//! Configuration types and loading.
//!
//! - `PilotConfig`: worker parameters and destinations, read from `config.yaml`
//! - `SchedulerConfig`: tick cadence, grace period, probe and state-file settings
//! - `RunPaths`: state file and log directory resolved next to the config file

mod settings;

pub use settings::{
    PilotConfig, ProbeKind, ResumePolicy, RunPaths, SchedulerConfig, default_config_path,
};
