use super::backend::TracingSink;
use super::config::LoggingConfig;
use crate::error::Result;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The six levels the rest of the daemon logs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete logging backend the facade forwards to
pub trait LogSink: Send + Sync {
    fn emit(&self, severity: Severity, args: fmt::Arguments<'_>);
}

/// Fixed six-level logging surface over a swappable [`LogSink`].
///
/// Cheap to clone; hand a copy to every component that logs.
///
/// ```no_run
/// use daemon_guard::logs::Logger;
///
/// let logger = Logger::initialize("/etc/daemon/logging.toml")?;
/// logger.info(format_args!("listening on {}", 8000));
/// # Ok::<(), daemon_guard::error::GuardError>(())
/// ```
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// Load the backend from `config_path`, install it as the process-wide
    /// default, and return a handle to it.
    ///
    /// The process-wide install can happen only once; later calls fail with
    /// [`GuardError::LoggerAlreadyInstalled`](crate::error::GuardError::LoggerAlreadyInstalled).
    pub fn initialize<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config = LoggingConfig::from_file(config_path.as_ref())?;
        let sink = TracingSink::from_config(&config)?;
        sink.install_global()?;
        Ok(Self::with_sink(Arc::new(sink)))
    }

    /// Build a logger from configuration without touching the global default
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        let sink = TracingSink::from_config(config)?;
        Ok(Self::with_sink(Arc::new(sink)))
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn log(&self, severity: Severity, args: fmt::Arguments<'_>) {
        self.sink.emit(severity, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Trace, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Error, args);
    }

    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Critical, args);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}
