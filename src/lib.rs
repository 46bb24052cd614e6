pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod launcher;
pub mod monitor;
pub mod rotation;
pub mod supervisor;
pub mod worker;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{PilotConfig, RunPaths, SchedulerConfig};
pub use error::{PilotError, Result};
pub use launcher::{BatchLauncher, DetachedSpawner, LaunchReport, Spawner, WorkerCommand};
pub use monitor::{Liveness, LivenessMonitor, ProcessProbe};
pub use rotation::{DestinationList, RotationPhase, RotationStore};
pub use supervisor::{RotationSupervisor, RunSummary, ShutdownSignal, SupervisorOptions, TickOutcome};
