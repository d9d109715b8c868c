// Startup sequence: instance guard, output redirection, logger

use super::output::{attach_output, OutputFile};
use super::pid::Acquisition;
use crate::config::StartupConfig;
use crate::error::Result;
use crate::logs::Logger;

/// Everything the daemon must hold on to after a successful startup
#[derive(Debug)]
pub struct Running {
    pub acquisition: Acquisition,
    /// Keep alive for the process lifetime when redirection is configured
    pub output: Option<OutputFile>,
    pub logger: Logger,
}

/// Run the startup guards in order.
///
/// The PID file comes first so that a second instance fails before it can
/// rotate the output file of the one already running. Errors are returned
/// as-is; whether to exit is up to the caller.
pub fn run(config: &StartupConfig) -> Result<Running> {
    let acquisition = config.pid_guard().acquire()?;

    let output = match &config.output_file {
        Some(path) => Some(attach_output(path)?),
        None => None,
    };

    let logger = Logger::initialize(&config.logging_config)?;

    logger.info(format_args!(
        "Acquired PID file {} for PID {}",
        config.pid_file.display(),
        acquisition.pid
    ));
    for stale in &acquisition.reclaimed {
        logger.warn(format_args!("Removed stale PID file left by PID {}", stale));
    }
    for failure in &acquisition.remove_failures {
        logger.warn(format_args!("Failed to remove stale PID file {}", failure));
    }
    if let Some(rotated) = output.as_ref().and_then(|o| o.rotated()) {
        logger.info(format_args!(
            "Moved previous output to {}",
            rotated.display()
        ));
    }

    Ok(Running {
        acquisition,
        output,
        logger,
    })
}
