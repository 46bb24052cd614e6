//! Shared fixtures for the integration tests.

#![allow(dead_code, unused_imports)]

pub mod probe;
pub mod rig;
pub mod spawner;

pub use probe::{Sample, ScriptedProbe};
pub use rig::{Rig, RigBuilder};
pub use spawner::{RecordingSpawner, SpawnRecord};
