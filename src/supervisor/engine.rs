//! Rotation control loop.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, info};

use super::shutdown::ShutdownSignal;
use crate::clock::SharedClock;
use crate::config::{ResumePolicy, SchedulerConfig};
use crate::error::{PilotError, Result};
use crate::launcher::{BatchLauncher, LaunchReport, clear_log_dir};
use crate::monitor::{Liveness, LivenessMonitor};
use crate::rotation::{DestinationList, RotationPhase, RotationStore};

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub tick_interval: Duration,
    pub grace_period: Duration,
    pub resume_policy: ResumePolicy,
    pub max_persist_failures: u32,
}

impl SupervisorOptions {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            tick_interval: Duration::from_secs(config.tick_interval_secs),
            grace_period: Duration::from_secs(config.grace_period_secs),
            resume_policy: config.resume_policy,
            max_persist_failures: config.max_persist_failures,
        }
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

/// What a single start or tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Initial batch started; `None` when attached to workers already running.
    Launched {
        index: usize,
        report: Option<LaunchReport>,
    },
    StillRunning {
        index: usize,
    },
    /// Probe failed; treated as running.
    Uncertain {
        index: usize,
    },
    /// No worker seen, grace period not yet over.
    Absent {
        index: usize,
        remaining: Duration,
    },
    BatchCompleted {
        index: usize,
    },
    Advanced {
        from: usize,
        index: usize,
        report: LaunchReport,
    },
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub batches_completed: u32,
    pub elapsed: Duration,
}

pub struct RotationSupervisor {
    destinations: DestinationList,
    store: RotationStore,
    launcher: BatchLauncher,
    monitor: LivenessMonitor,
    clock: SharedClock,
    options: SupervisorOptions,
    log_dir: PathBuf,
    phase: RotationPhase,
    started: bool,
    batches_completed: u32,
    shutdown: ShutdownSignal,
}

impl RotationSupervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        destinations: DestinationList,
        store: RotationStore,
        launcher: BatchLauncher,
        monitor: LivenessMonitor,
        clock: SharedClock,
        options: SupervisorOptions,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        let phase = RotationPhase::Launching {
            index: destinations.initial_index(),
        };
        Self {
            destinations,
            store,
            launcher,
            monitor,
            clock,
            options,
            log_dir: log_dir.into(),
            phase,
            started: false,
            batches_completed: 0,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    /// Load (or create) the persisted index and launch its batch.
    pub async fn start(&mut self) -> Result<TickOutcome> {
        if self.started {
            return Err(PilotError::Other("supervisor already started".into()));
        }

        let (index, resumed) = self
            .store
            .load_or_init(self.destinations.initial_index())
            .await?;
        let destination = self.destinations.check_index(index)?.to_path_buf();
        self.phase = RotationPhase::Launching { index };
        self.started = true;

        info!(
            index,
            resumed,
            destination = %destination.display(),
            destinations = self.destinations.len(),
            "Starting rotation"
        );

        if resumed && self.options.resume_policy == ResumePolicy::Attach {
            let liveness = self.monitor.check().await;
            if liveness == Liveness::Running {
                info!(index, "Workers already running, attaching to existing batch");
                self.phase = self.phase.transition(RotationPhase::waiting(index))?;
                return Ok(TickOutcome::Launched {
                    index,
                    report: None,
                });
            }
        }

        let report = self.launcher.launch(&destination, &self.shutdown).await?;
        self.phase = self.phase.transition(RotationPhase::waiting(index))?;
        Ok(TickOutcome::Launched {
            index,
            report: Some(report),
        })
    }

    /// Evaluate exactly one state transition.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        if !self.started {
            return self.start().await;
        }

        match self.phase {
            RotationPhase::Launching { index } => {
                let destination = self.destinations.check_index(index)?.to_path_buf();
                let report = self.launcher.launch(&destination, &self.shutdown).await?;
                self.phase = self.phase.transition(RotationPhase::waiting(index))?;
                Ok(TickOutcome::Launched {
                    index,
                    report: Some(report),
                })
            }
            RotationPhase::WaitingForCompletion {
                index,
                absent_since,
            } => self.observe(index, absent_since).await,
            RotationPhase::Advancing { index } => self.advance(index).await,
            RotationPhase::Exhausted => Ok(TickOutcome::Exhausted),
        }
    }

    async fn observe(
        &mut self,
        index: usize,
        absent_since: Option<std::time::Instant>,
    ) -> Result<TickOutcome> {
        let liveness = self.monitor.check().await;

        if !liveness.is_confirmed_absent() {
            if absent_since.is_some() {
                debug!(index, %liveness, "Worker observed again, grace period reset");
            }
            self.phase = self.phase.transition(RotationPhase::waiting(index))?;
            return Ok(if liveness == Liveness::Running {
                TickOutcome::StillRunning { index }
            } else {
                TickOutcome::Uncertain { index }
            });
        }

        let now = self.clock.now();
        let since = absent_since.unwrap_or(now);
        let absent_for = now.saturating_duration_since(since);

        if absent_for >= self.options.grace_period {
            info!(
                index,
                absent_secs = absent_for.as_secs(),
                "Batch complete"
            );
            self.batches_completed += 1;
            self.phase = self.phase.transition(RotationPhase::Advancing { index })?;
            return Ok(TickOutcome::BatchCompleted { index });
        }

        if absent_since.is_none() {
            info!(
                index,
                grace_secs = self.options.grace_period.as_secs(),
                "No worker running, waiting out grace period"
            );
        }
        self.phase = self.phase.transition(RotationPhase::WaitingForCompletion {
            index,
            absent_since: Some(since),
        })?;
        Ok(TickOutcome::Absent {
            index,
            remaining: self.options.grace_period - absent_for,
        })
    }

    async fn advance(&mut self, index: usize) -> Result<TickOutcome> {
        let Some(next) = index.checked_sub(1) else {
            self.store.clear().await?;
            let removed = clear_log_dir(&self.log_dir).await;
            self.phase = self.phase.transition(RotationPhase::Exhausted)?;
            info!(removed_logs = removed, "All destinations done");
            return Ok(TickOutcome::Exhausted);
        };

        let destination = self.destinations.check_index(next)?.to_path_buf();
        // Persist before launching: a crash after this point resumes at `next`.
        self.store.store(next).await?;
        info!(
            from = index,
            index = next,
            destination = %destination.display(),
            "Advanced rotation"
        );

        let report = self.launcher.launch(&destination, &self.shutdown).await?;
        self.phase = self.phase.transition(RotationPhase::waiting(next))?;
        Ok(TickOutcome::Advanced {
            from: index,
            index: next,
            report,
        })
    }

    /// Tick every `tick_interval` until the rotation is exhausted or `shutdown`
    /// fires. Persistence failures are retried on later ticks up to
    /// `max_persist_failures` in a row; every other error ends the run.
    pub async fn run(&mut self, shutdown: ShutdownSignal) -> Result<RunSummary> {
        let started_at = self.clock.now();
        // Batch launches stagger their spawns; they watch the same signal.
        self.shutdown = shutdown.clone();
        if !self.started {
            self.start().await?;
        }

        let mut persist_failures: u32 = 0;
        while !self.phase.kind().is_terminal() {
            tokio::select! {
                _ = self.clock.sleep(self.options.tick_interval) => {}
                _ = shutdown.wait() => {
                    info!(phase = %self.phase, "Supervisor stopped before exhaustion");
                    return Err(PilotError::Interrupted);
                }
            }

            match self.tick().await {
                Ok(outcome) => {
                    persist_failures = 0;
                    debug!(?outcome, phase = %self.phase, "Tick");
                }
                Err(e) if e.is_persistence() => {
                    persist_failures += 1;
                    error!(
                        error = %e,
                        consecutive_failures = persist_failures,
                        phase = %self.phase,
                        "Rotation state could not be persisted"
                    );
                    if persist_failures >= self.options.max_persist_failures {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(RunSummary {
            batches_completed: self.batches_completed,
            elapsed: self.clock.now().saturating_duration_since(started_at),
        })
    }
}
