// Output formatting and display for CLI

use crate::daemon::PidStatus;
use crate::error::{GuardError, Result};
use colored::*;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct StatusReport<'a> {
    pid_file: &'a Path,
    #[serde(flatten)]
    status: &'a PidStatus,
}

/// Print a PID file status to stdout
pub fn print_status(path: &Path, status: &PidStatus) {
    match status {
        PidStatus::Absent => {
            println!("{}", "✗ No PID file".yellow().bold());
        }

        PidStatus::Running(pid) => {
            println!("{}", "✓ Daemon is running".green().bold());
            println!("  {}: {}", "PID".bold(), pid);
        }

        PidStatus::Stale(pid) => {
            println!("{}", "✗ PID file is stale".red().bold());
            println!("  {}: {} (not alive)", "PID".bold(), pid);
        }

        PidStatus::Corrupt(content) => {
            println!("{}", "✗ PID file is corrupt".red().bold());
            println!("  {}: {:?}", "Content".bold(), content);
        }
    }
    println!("  {}: {}", "PID file".bold(), path.display().to_string().cyan());
}

/// Print a PID file status as JSON
pub fn print_status_json(path: &Path, status: &PidStatus) -> Result<()> {
    let report = StatusReport {
        pid_file: path,
        status,
    };
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| GuardError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

pub fn print_released(path: &Path) {
    println!(
        "{}",
        format!("✓ Released {}", path.display()).green().bold()
    );
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}
