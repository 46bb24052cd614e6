use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "plot-pilot")]
#[command(author, version, about = "Rotating plot batch supervisor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config.yaml (default: next to the executable)
    #[arg(long, global = true, env = "PLOT_PILOT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Supervise the rotation until every destination is done
    Run,

    /// Show the persisted rotation position and worker liveness
    Status {
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Delete the rotation state so the next run starts from the last destination
    Reset,

    /// Check the configuration and the directories it names
    Validate,
}
