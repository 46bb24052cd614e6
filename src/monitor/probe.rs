use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;

/// Answers whether at least one process called `process_name` is alive.
///
/// An `Err` means the process table could not be read; it is never a "no".
#[async_trait]
pub trait ProcessProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn is_running(&self, process_name: &str) -> Result<bool>;
}

pub type BoxedProbe = Arc<dyn ProcessProbe>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Running,
    NotRunning,
    /// Enumeration failed. Callers treat this as still running.
    Unknown,
}

impl Liveness {
    pub fn is_confirmed_absent(&self) -> bool {
        matches!(self, Liveness::NotRunning)
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::NotRunning => "not running",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

pub struct LivenessMonitor {
    probe: BoxedProbe,
    process_name: String,
}

impl LivenessMonitor {
    pub fn new(probe: BoxedProbe, process_name: impl Into<String>) -> Self {
        Self {
            probe,
            process_name: process_name.into(),
        }
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub async fn check(&self) -> Liveness {
        match self.probe.is_running(&self.process_name).await {
            Ok(true) => Liveness::Running,
            Ok(false) => {
                debug!(process = %self.process_name, probe = self.probe.name(), "No worker process found");
                Liveness::NotRunning
            }
            Err(e) => {
                warn!(
                    process = %self.process_name,
                    probe = self.probe.name(),
                    error = %e,
                    "Process enumeration failed"
                );
                Liveness::Unknown
            }
        }
    }
}

/// Compare a process name or command-line token against the wanted worker
/// name: directory and a trailing `.exe` are ignored, ASCII case-insensitive.
pub fn matches_process_name(candidate: &str, wanted: &str) -> bool {
    let base = |s: &str| {
        let file = s.rsplit(['/', '\\']).next().unwrap_or(s);
        let len = file.len();
        if len > 4 && file.is_char_boundary(len - 4) && file[len - 4..].eq_ignore_ascii_case(".exe") {
            file[..len - 4].to_string()
        } else {
            file.to_string()
        }
    };
    let wanted = base(wanted.trim());
    !wanted.is_empty() && base(candidate.trim()).eq_ignore_ascii_case(&wanted)
}
