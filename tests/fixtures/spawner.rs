//! Spawner that records invocations instead of starting processes.

use std::path::PathBuf;
use std::time::Duration;

use parking_lot::Mutex;

use plot_pilot::clock::ManualClock;
use plot_pilot::error::Result;
use plot_pilot::launcher::{Spawner, WorkerInvocation};

#[derive(Debug, Clone)]
pub struct SpawnRecord {
    pub invocation: WorkerInvocation,
    /// Virtual time of the spawn.
    pub at: Duration,
}

impl SpawnRecord {
    fn arg_after(&self, flag: &str) -> Option<PathBuf> {
        let args = &self.invocation.args;
        let pos = args.iter().position(|a| a == flag)?;
        args.get(pos + 1).map(PathBuf::from)
    }

    pub fn destination(&self) -> PathBuf {
        self.arg_after("-d").unwrap_or_default()
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.arg_after("-t").unwrap_or_default()
    }
}

pub struct RecordingSpawner {
    clock: ManualClock,
    records: Mutex<Vec<SpawnRecord>>,
    fail_all: bool,
}

impl RecordingSpawner {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            records: Mutex::new(Vec::new()),
            fail_all: false,
        }
    }

    pub fn failing(clock: ManualClock) -> Self {
        Self {
            fail_all: true,
            ..Self::new(clock)
        }
    }

    pub fn records(&self) -> Vec<SpawnRecord> {
        self.records.lock().clone()
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.records().iter().map(SpawnRecord::destination).collect()
    }
}

impl Spawner for RecordingSpawner {
    fn spawn(&self, invocation: &WorkerInvocation) -> Result<Option<u32>> {
        if self.fail_all {
            return Err(std::io::Error::from(std::io::ErrorKind::NotFound).into());
        }
        let mut records = self.records.lock();
        records.push(SpawnRecord {
            invocation: invocation.clone(),
            at: self.clock.elapsed(),
        });
        Ok(Some(40_000 + records.len() as u32))
    }
}
