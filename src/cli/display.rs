use console::{Style, style};
use serde::Serialize;

use crate::monitor::Liveness;
use crate::supervisor::RunSummary;

/// Snapshot printed by `plot-pilot status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state_file: String,
    pub index: Option<usize>,
    pub destination: Option<String>,
    pub destinations: usize,
    pub remaining_batches: usize,
    pub process_name: String,
    pub liveness: Liveness,
    pub checked_at: chrono::DateTime<chrono::Local>,
}

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_status(&self, report: &StatusReport) {
        self.print_header("Rotation");

        match (report.index, &report.destination) {
            (Some(index), Some(dest)) => {
                println!("Index:       {} of {}", style(index).bold(), report.destinations);
                println!("Destination: {}", style(dest).white().bold());
            }
            (Some(index), None) => {
                println!(
                    "Index:       {} {}",
                    style(index).red().bold(),
                    style(format!("(out of range for {} destinations)", report.destinations)).red()
                );
            }
            _ => println!("Index:       {}", style("not started").dim()),
        }
        println!("Remaining:   {} batch(es)", report.remaining_batches);
        println!(
            "Workers:     {} ({})",
            self.liveness_style(report.liveness)
                .apply_to(report.liveness.to_string()),
            report.process_name
        );
        println!();
        println!(
            "{}",
            style(format!(
                "State file: {}  Checked: {}",
                report.state_file,
                report.checked_at.format("%Y-%m-%d %H:%M:%S")
            ))
            .dim()
        );
    }

    pub fn print_summary(&self, summary: &RunSummary) {
        self.print_success(&format!(
            "Rotation complete: {} batch(es) in {}s",
            summary.batches_completed,
            summary.elapsed.as_secs()
        ));
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    fn liveness_style(&self, liveness: Liveness) -> Style {
        match liveness {
            Liveness::Running => Style::new().yellow().bold(),
            Liveness::NotRunning => Style::new().green(),
            Liveness::Unknown => Style::new().red(),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
