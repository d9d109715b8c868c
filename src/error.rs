use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the startup guard
#[derive(Debug, Error)]
pub enum GuardError {
    // Instance guard errors
    #[error("Daemon already running with PID {pid} (PID file: {})", path.display())]
    AlreadyRunning { pid: u32, path: PathBuf },

    #[error("Cannot parse PID file {}: {content:?} is not a positive integer", path.display())]
    CorruptPidFile { path: PathBuf, content: String },

    #[error("Cannot read PID file {}: {source}", path.display())]
    PidFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove stale PID file {}: {source}", path.display())]
    StaleRemoval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Gave up acquiring PID file {} after {attempts} attempts", path.display())]
    RetriesExhausted { path: PathBuf, attempts: u32 },

    // Output redirection errors
    #[error("Cannot move old out file {} to {}: {source}", from.display(), to.display())]
    Rotation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to redirect output: {0}")]
    Redirect(String),

    // Logging facade errors
    #[error("Cannot start logger: {0}")]
    LoggerConfig(String),

    #[error("A process-wide logger is already installed")]
    LoggerAlreadyInstalled,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // System errors
    #[error("Signal error: {0}")]
    Signal(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for guard operations
pub type Result<T> = std::result::Result<T, GuardError>;
