// CLI module - User-facing command-line interface

mod output;

pub use output::print_error;

use crate::config::StartupConfig;
use crate::daemon::{startup, PidFile, PidStatus, ProcTable};
use crate::error::{GuardError, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// daemon-guard - single-instance and output guard for long-running daemons
#[derive(Parser)]
#[command(name = "daemon-guard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the startup sequence and stay up until Ctrl-C
    Run {
        /// Startup configuration file (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show who holds a PID file
    Status {
        /// PID file to inspect
        #[arg(short, long)]
        pid_file: PathBuf,

        /// Probe this process registry instead of the platform default
        #[arg(long)]
        proc_root: Option<PathBuf>,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a PID file whose owner is gone
    Release {
        /// PID file to remove
        #[arg(short, long)]
        pid_file: PathBuf,

        /// Remove it even if the owner is alive
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Run the CLI application
    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute()
    }

    /// Execute the parsed command
    fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Run { config } => run_daemon(config),

            Commands::Status {
                pid_file,
                proc_root,
                json,
            } => {
                let guard = pid_guard(pid_file, proc_root.as_deref());
                let status = guard.status()?;
                if *json {
                    output::print_status_json(guard.path(), &status)
                } else {
                    output::print_status(guard.path(), &status);
                    Ok(())
                }
            }

            Commands::Release { pid_file, force } => {
                let guard = PidFile::with_path(pid_file);
                if let PidStatus::Running(pid) = guard.status()? {
                    if !*force {
                        return Err(GuardError::AlreadyRunning {
                            pid,
                            path: pid_file.clone(),
                        });
                    }
                }
                guard.release()?;
                output::print_released(guard.path());
                Ok(())
            }
        }
    }
}

fn pid_guard(pid_file: &Path, proc_root: Option<&Path>) -> PidFile {
    let guard = PidFile::with_path(pid_file);
    match proc_root {
        Some(root) => guard.with_probe(ProcTable::with_root(root)),
        None => guard,
    }
}

/// Start up, then park the main thread until interrupted
fn run_daemon(config_path: &Path) -> Result<()> {
    let config = StartupConfig::from_file(config_path)?;
    let running = startup::run(&config)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| GuardError::Signal(format!("Failed to install Ctrl-C handler: {}", e)))?;

    running
        .logger
        .info(format_args!("Daemon running with PID {}", running.acquisition.pid));

    let _ = rx.recv();

    running.logger.info(format_args!("Shutting down"));
    Ok(())
}
