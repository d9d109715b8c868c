// tracing-subscriber backend behind the logging facade

use super::config::{LogFormat, LoggingConfig};
use super::facade::{LogSink, Severity};
use crate::error::{GuardError, Result};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Forwards facade calls to a `tracing` dispatcher.
///
/// `tracing` tops out at ERROR, so `Critical` is emitted at ERROR with a
/// `critical = true` field.
pub struct TracingSink {
    dispatch: Dispatch,
}

impl TracingSink {
    /// Build the backend, writing to `config.file` or stderr
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        let writer = match &config.file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).map_err(|e| {
                            GuardError::LoggerConfig(format!(
                                "Failed to create log directory {}: {}",
                                parent.display(),
                                e
                            ))
                        })?;
                    }
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        GuardError::LoggerConfig(format!(
                            "Failed to open log file {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                BoxMakeWriter::new(Mutex::new(file))
            }
            None => BoxMakeWriter::new(io::stderr),
        };

        Self::with_writer(config, writer)
    }

    /// Build the backend around an arbitrary writer
    pub fn with_writer(config: &LoggingConfig, writer: BoxMakeWriter) -> Result<Self> {
        let filter = EnvFilter::try_new(&config.level).map_err(|e| {
            GuardError::LoggerConfig(format!("Invalid level '{}': {}", config.level, e))
        })?;

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(config.ansi)
            .with_target(config.target)
            .with_thread_ids(config.thread_ids);

        let dispatch = match config.format {
            LogFormat::Full => Dispatch::new(builder.finish()),
            LogFormat::Compact => Dispatch::new(builder.compact().finish()),
            LogFormat::Pretty => Dispatch::new(builder.pretty().finish()),
        };

        Ok(Self { dispatch })
    }

    /// Make this backend the process-wide default. Succeeds once per process.
    pub fn install_global(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| GuardError::LoggerAlreadyInstalled)
    }
}

impl LogSink for TracingSink {
    fn emit(&self, severity: Severity, args: fmt::Arguments<'_>) {
        tracing::dispatcher::with_default(&self.dispatch, || match severity {
            Severity::Trace => tracing::trace!("{}", args),
            Severity::Debug => tracing::debug!("{}", args),
            Severity::Info => tracing::info!("{}", args),
            Severity::Warn => tracing::warn!("{}", args),
            Severity::Error => tracing::error!("{}", args),
            Severity::Critical => tracing::error!(critical = true, "{}", args),
        });
    }
}

impl fmt::Debug for TracingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn sink_with(level: &str) -> (TracingSink, SharedBuf) {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let config = LoggingConfig {
            level: level.to_string(),
            ..LoggingConfig::default()
        };
        let sink = TracingSink::with_writer(&config, BoxMakeWriter::new(move || writer.clone()))
            .unwrap();
        (sink, buf)
    }

    #[test]
    fn test_levels_map_to_tracing() {
        let (sink, buf) = sink_with("trace");

        sink.emit(Severity::Trace, format_args!("trace line"));
        sink.emit(Severity::Warn, format_args!("warn {}", "line"));

        let out = buf.contents();
        assert!(out.contains("TRACE"));
        assert!(out.contains("trace line"));
        assert!(out.contains("WARN"));
        assert!(out.contains("warn line"));
    }

    #[test]
    fn test_critical_is_error_with_marker() {
        let (sink, buf) = sink_with("info");

        sink.emit(Severity::Critical, format_args!("disk {} gone", "sda"));

        let out = buf.contents();
        assert!(out.contains("ERROR"));
        assert!(out.contains("disk sda gone"));
        assert!(out.contains("critical=true"));
    }

    #[test]
    fn test_filter_drops_lower_levels() {
        let (sink, buf) = sink_with("warn");

        sink.emit(Severity::Info, format_args!("chatty"));
        sink.emit(Severity::Error, format_args!("broken"));

        let out = buf.contents();
        assert!(!out.contains("chatty"));
        assert!(out.contains("broken"));
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "daemon=loud".to_string(),
            ..LoggingConfig::default()
        };
        let result = TracingSink::with_writer(&config, BoxMakeWriter::new(io::sink));
        assert!(matches!(result, Err(GuardError::LoggerConfig(_))));
    }
}
