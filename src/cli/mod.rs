//! Command-line interface definitions.
//!
//! - `Cli`, `Commands`: argument definitions via clap
//! - `Display`: styled terminal output

mod commands;
mod display;

pub use commands::{Cli, Commands, OutputFormat};
pub use display::{Display, StatusReport};
