//! Rotation supervisor: drives the phase machine from periodic liveness checks.

mod engine;
mod shutdown;

pub use engine::{RotationSupervisor, RunSummary, SupervisorOptions, TickOutcome};
pub use shutdown::ShutdownSignal;
