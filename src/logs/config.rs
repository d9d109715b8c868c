use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Line layout of emitted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

/// Backend configuration for the logging facade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives, e.g. `info` or `warn,daemon_guard=debug`
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Emit ANSI colour codes
    #[serde(default)]
    pub ansi: bool,

    /// Include the event target (module path)
    #[serde(default = "default_target")]
    pub target: bool,

    #[serde(default)]
    pub thread_ids: bool,

    /// Append records to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_target() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            ansi: false,
            target: default_target(),
            thread_ids: false,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Load logging configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GuardError::LoggerConfig(format!(
                "Failed to read logging config {}: {}",
                path.display(),
                e
            ))
        })?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let config: LoggingConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| GuardError::LoggerConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| GuardError::LoggerConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(GuardError::LoggerConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.level.trim().is_empty() {
            return Err(GuardError::LoggerConfig("level must not be empty".to_string()));
        }

        if let Some(ref file) = self.file {
            if file.as_os_str().is_empty() {
                return Err(GuardError::LoggerConfig(
                    "file must not be an empty path".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logging.toml");
        fs::write(&path, "").unwrap();

        let config = LoggingConfig::from_file(&path).unwrap();
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_json_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logging.json");
        fs::write(
            &path,
            r#"{"level": "debug", "format": "compact", "file": "/var/log/daemon.log"}"#,
        )
        .unwrap();

        let config = LoggingConfig::from_file(&path).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.file, Some(PathBuf::from("/var/log/daemon.log")));
        assert!(config.target);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logging.toml");
        fs::write(&path, "format = \"xml\"").unwrap();

        assert!(matches!(
            LoggingConfig::from_file(&path),
            Err(GuardError::LoggerConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = LoggingConfig::from_file(Path::new("/nonexistent/logging.toml"));
        assert!(matches!(result, Err(GuardError::LoggerConfig(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logging.xml");
        fs::write(&path, "<seelog/>").unwrap();

        assert!(LoggingConfig::from_file(&path).is_err());
    }
}
