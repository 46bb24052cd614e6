use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use plot_pilot::cli::{Cli, Commands, Display, OutputFormat, StatusReport};
use plot_pilot::clock::{SharedClock, SystemClock};
use plot_pilot::config::{PilotConfig, RunPaths, default_config_path};
use plot_pilot::error::Result;
use plot_pilot::launcher::{BatchLauncher, DetachedSpawner, WorkerCommand};
use plot_pilot::monitor::{LivenessMonitor, probe_for};
use plot_pilot::rotation::{DestinationList, RotationStore};
use plot_pilot::supervisor::{RotationSupervisor, ShutdownSignal, SupervisorOptions};
use plot_pilot::worker::{locate_executable, resolve_credentials};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let display = Display::new();
            display.print_error(&e.to_string());
            if e.is_startup() {
                display.print_info("Fix config.yaml or the directories it names, then run `plot-pilot validate`");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("plot_pilot=debug")
    } else {
        EnvFilter::new("plot_pilot=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let config_path = cli.config.unwrap_or_else(default_config_path);

    match cli.command {
        Commands::Run => cmd_run(&display, config_path).await,
        Commands::Status { output } => cmd_status(&display, config_path, output).await,
        Commands::Reset => cmd_reset(&display, config_path).await,
        Commands::Validate => cmd_validate(&display, config_path).await,
    }
}

async fn cmd_run(display: &Display, config_path: PathBuf) -> Result<()> {
    let config = PilotConfig::load(&config_path).await?;
    config.validate_paths()?;

    let paths = RunPaths::new(&config_path, &config);
    paths.ensure_dirs().await?;

    let executable = locate_executable(&config.run_path)?;
    let credentials = resolve_credentials(&config, &executable).await?;
    let command = WorkerCommand::new(&executable, &config, &credentials);

    let mut workspaces = vec![config.temp_path.clone()];
    if let Some(secondary) = config.secondary_temp() {
        workspaces.push(secondary.to_path_buf());
    }

    let clock: SharedClock = Arc::new(SystemClock);
    let launcher = BatchLauncher::new(
        command,
        workspaces,
        config.total,
        Duration::from_secs(config.sleep),
        &paths.log_dir,
        Arc::new(DetachedSpawner),
        clock.clone(),
    );
    let scheduler = &config.scheduler;
    let monitor = LivenessMonitor::new(probe_for(scheduler.probe), &scheduler.process_name);

    let mut supervisor = RotationSupervisor::new(
        DestinationList::new(config.final_path.clone())?,
        RotationStore::new(&paths.state_file),
        launcher,
        monitor,
        clock,
        SupervisorOptions::from_config(scheduler),
        &paths.log_dir,
    );

    info!(
        config = %config_path.display(),
        base_dir = %paths.base_dir.display(),
        executable = %executable.display(),
        destinations = config.final_path.len(),
        "plot-pilot starting"
    );

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();

    let summary = supervisor.run(shutdown).await?;
    display.print_summary(&summary);
    Ok(())
}

async fn cmd_status(display: &Display, config_path: PathBuf, output: OutputFormat) -> Result<()> {
    let config = PilotConfig::load(&config_path).await?;
    let paths = RunPaths::new(&config_path, &config);
    let destinations = DestinationList::new(config.final_path.clone())?;
    let store = RotationStore::new(&paths.state_file);

    let index = store.peek().await?;
    let destination = index
        .and_then(|i| destinations.get(i))
        .map(|d| d.display().to_string());
    // Batches not yet finished, including the one at `index`.
    let remaining_batches = match index {
        Some(i) if i < destinations.len() => i + 1,
        Some(_) => 0,
        None => destinations.len(),
    };

    let scheduler = &config.scheduler;
    let monitor = LivenessMonitor::new(probe_for(scheduler.probe), &scheduler.process_name);

    let report = StatusReport {
        state_file: store.path().display().to_string(),
        index,
        destination,
        destinations: destinations.len(),
        remaining_batches,
        process_name: monitor.process_name().to_string(),
        liveness: monitor.check().await,
        checked_at: chrono::Local::now(),
    };

    match output {
        OutputFormat::Text => display.print_status(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

async fn cmd_reset(display: &Display, config_path: PathBuf) -> Result<()> {
    let config = PilotConfig::load(&config_path).await?;
    let paths = RunPaths::new(&config_path, &config);
    let store = RotationStore::new(&paths.state_file);

    match store.peek().await {
        Ok(None) => {
            display.print_info("No rotation state to reset");
            return Ok(());
        }
        Ok(Some(index)) => display.print_info(&format!("Discarding rotation at index {index}")),
        Err(e) => display.print_warning(&format!("Discarding unreadable rotation state: {e}")),
    }

    store.clear().await?;
    display.print_success(&format!("Removed {}", store.path().display()));
    Ok(())
}

async fn cmd_validate(display: &Display, config_path: PathBuf) -> Result<()> {
    let config = PilotConfig::load(&config_path).await?;
    config.validate_paths()?;
    let executable = locate_executable(&config.run_path)?;

    display.print_success(&format!("{} is valid", config_path.display()));
    display.print_info(&format!("Worker: {}", executable.display()));
    display.print_info(&format!(
        "{} destination(s), {} worker(s) per batch",
        config.final_path.len(),
        config.total as usize * (1 + usize::from(config.secondary_temp().is_some()))
    ));
    if !config.has_credentials() {
        display.print_warning("FarmerKey/PoolKey not set; keys will be read from the worker at startup");
    }
    Ok(())
}
