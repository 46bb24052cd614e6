//! Worker liveness: "is at least one worker process still in the process table?"
//!
//! The supervisor only sees [`LivenessMonitor`]; the probe behind it is picked
//! at startup from configuration.

mod probe;
mod ps_probe;
mod sysinfo_probe;

use std::sync::Arc;

pub use probe::{BoxedProbe, Liveness, LivenessMonitor, ProcessProbe, matches_process_name};
pub use ps_probe::{PsProbe, ps_listing_contains, tasklist_contains};
pub use sysinfo_probe::SysinfoProbe;

use crate::config::ProbeKind;

pub fn probe_for(kind: ProbeKind) -> BoxedProbe {
    match kind {
        ProbeKind::Sysinfo => Arc::new(SysinfoProbe),
        ProbeKind::Ps => Arc::new(PsProbe),
    }
}
