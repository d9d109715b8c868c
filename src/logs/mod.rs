// Logs module - Leveled logging facade over a configurable backend

mod backend;
mod config;
mod facade;

pub use backend::TracingSink;
pub use config::{LogFormat, LoggingConfig};
pub use facade::{LogSink, Logger, Severity};
