//! Rotation position: destination list, phase machine, and durable store.

mod destinations;
mod phase;
mod store;

pub use destinations::DestinationList;
pub use phase::{PhaseKind, RotationPhase};
pub use store::RotationStore;
