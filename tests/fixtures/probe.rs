//! Process probe replaying a fixed script of answers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use plot_pilot::error::{PilotError, Result};
use plot_pilot::monitor::ProcessProbe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Running,
    NotRunning,
    Fails,
}

/// Returns the scripted samples in order, then `fallback` forever.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<Sample>>,
    fallback: Sample,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(script: impl IntoIterator<Item = Sample>, fallback: Sample) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    /// No worker ever seen.
    pub fn idle() -> Arc<Self> {
        Self::new([], Sample::NotRunning)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessProbe for ScriptedProbe {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn is_running(&self, _process_name: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let sample = self.script.lock().pop_front().unwrap_or(self.fallback);
        match sample {
            Sample::Running => Ok(true),
            Sample::NotRunning => Ok(false),
            Sample::Fails => Err(PilotError::Probe("process table unavailable".into())),
        }
    }
}
