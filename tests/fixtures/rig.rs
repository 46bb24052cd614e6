//! Temporary plotting rig: destination, temp and state directories on disk
//! plus a supervisor wired to scripted collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use plot_pilot::clock::{ManualClock, SharedClock};
use plot_pilot::config::PilotConfig;
use plot_pilot::launcher::{BatchLauncher, WorkerCommand};
use plot_pilot::monitor::LivenessMonitor;
use plot_pilot::rotation::{DestinationList, RotationStore};
use plot_pilot::supervisor::{RotationSupervisor, SupervisorOptions};
use plot_pilot::worker::Credentials;

use super::probe::ScriptedProbe;
use super::spawner::RecordingSpawner;

pub struct RigBuilder {
    destinations: Vec<&'static str>,
    total: u32,
    stagger: Duration,
    secondary_temp: bool,
    options: SupervisorOptions,
    failing_spawner: bool,
}

impl RigBuilder {
    pub fn new(destinations: &[&'static str]) -> Self {
        Self {
            destinations: destinations.to_vec(),
            total: 1,
            stagger: Duration::ZERO,
            secondary_temp: false,
            options: SupervisorOptions {
                tick_interval: Duration::from_secs(3),
                grace_period: Duration::ZERO,
                ..Default::default()
            },
            failing_spawner: false,
        }
    }

    pub fn total(mut self, total: u32) -> Self {
        self.total = total;
        self
    }

    pub fn stagger_secs(mut self, secs: u64) -> Self {
        self.stagger = Duration::from_secs(secs);
        self
    }

    pub fn secondary_temp(mut self) -> Self {
        self.secondary_temp = true;
        self
    }

    pub fn grace_secs(mut self, secs: u64) -> Self {
        self.options.grace_period = Duration::from_secs(secs);
        self
    }

    pub fn options(mut self, f: impl FnOnce(&mut SupervisorOptions)) -> Self {
        f(&mut self.options);
        self
    }

    pub fn failing_spawner(mut self) -> Self {
        self.failing_spawner = true;
        self
    }

    pub fn build(self) -> Rig {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        let destinations: Vec<PathBuf> = self
            .destinations
            .iter()
            .map(|name| {
                let path = root.join("plots").join(name);
                std::fs::create_dir_all(&path).expect("create destination");
                path
            })
            .collect();

        let mut workspaces = vec![root.join("temp1")];
        if self.secondary_temp {
            workspaces.push(root.join("temp2"));
        }
        for ws in &workspaces {
            std::fs::create_dir_all(ws).expect("create temp");
        }
        let log_dir = root.join("log");
        std::fs::create_dir_all(&log_dir).expect("create log dir");

        let clock = ManualClock::new();
        let spawner = Arc::new(if self.failing_spawner {
            RecordingSpawner::failing(clock.clone())
        } else {
            RecordingSpawner::new(clock.clone())
        });

        Rig {
            dir,
            destinations,
            workspaces,
            log_dir,
            clock,
            spawner,
            total: self.total,
            stagger: self.stagger,
            options: self.options,
        }
    }
}

pub struct Rig {
    dir: TempDir,
    pub destinations: Vec<PathBuf>,
    pub workspaces: Vec<PathBuf>,
    pub log_dir: PathBuf,
    pub clock: ManualClock,
    pub spawner: Arc<RecordingSpawner>,
    total: u32,
    stagger: Duration,
    options: SupervisorOptions,
}

impl Rig {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_file(&self) -> PathBuf {
        self.root().join("nb")
    }

    pub fn store(&self) -> RotationStore {
        RotationStore::new(self.state_file())
    }

    pub fn destination(&self, index: usize) -> PathBuf {
        self.destinations[index].clone()
    }

    /// A fresh supervisor over the same on-disk state, as after a restart.
    pub fn supervisor(&self, probe: Arc<ScriptedProbe>) -> RotationSupervisor {
        let command = WorkerCommand::new(
            "/opt/chia/chia",
            &PilotConfig::default(),
            &Credentials {
                farmer_key: "farmer-pk".into(),
                pool_key: "pool-pk".into(),
            },
        );
        let clock: SharedClock = Arc::new(self.clock.clone());
        let launcher = BatchLauncher::new(
            command,
            self.workspaces.clone(),
            self.total,
            self.stagger,
            &self.log_dir,
            self.spawner.clone(),
            clock.clone(),
        );

        RotationSupervisor::new(
            DestinationList::new(self.destinations.clone()).expect("destinations"),
            self.store(),
            launcher,
            LivenessMonitor::new(probe, "chia"),
            clock,
            self.options.clone(),
            &self.log_dir,
        )
    }
}
