use crate::daemon::pid::{PidFile, ProcTable, RetryPolicy, SignalProbe, DEFAULT_PROC_ROOT};
use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the liveness of a recorded PID is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Look for `<proc_root>/<pid>`
    Procfs,
    /// Send signal 0
    Signal,
}

impl Default for ProbeKind {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            ProbeKind::Procfs
        } else {
            ProbeKind::Signal
        }
    }
}

/// Startup configuration: where the guard keeps its files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    /// PID marker file
    pub pid_file: PathBuf,

    /// File that stdout and stderr get bound to; no redirection when unset
    #[serde(default)]
    pub output_file: Option<PathBuf>,

    /// Logging backend configuration, passed through to the facade
    pub logging_config: PathBuf,

    #[serde(default)]
    pub probe: ProbeKind,

    /// Root of the live-process registry for the `procfs` probe
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_proc_root() -> PathBuf {
    PathBuf::from(DEFAULT_PROC_ROOT)
}

impl StartupConfig {
    /// Load startup configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Self> {
        // Read file contents
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GuardError::Config(format!("Failed to read config file: {}", e)))?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config: StartupConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| GuardError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| GuardError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(GuardError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.pid_file.as_os_str().is_empty() {
            return Err(GuardError::ConfigValidation(
                "pid_file must not be empty".to_string(),
            ));
        }

        if self.logging_config.as_os_str().is_empty() {
            return Err(GuardError::ConfigValidation(
                "logging_config must not be empty".to_string(),
            ));
        }

        if let Some(ref output) = self.output_file {
            if output.as_os_str().is_empty() {
                return Err(GuardError::ConfigValidation(
                    "output_file must not be empty when set".to_string(),
                ));
            }
            if output == &self.pid_file {
                return Err(GuardError::ConfigValidation(
                    "output_file and pid_file must differ".to_string(),
                ));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(GuardError::ConfigValidation(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the PID file guard described by this configuration
    pub fn pid_guard(&self) -> PidFile {
        let pid_file = PidFile::with_path(&self.pid_file).with_policy(self.retry);
        match self.probe {
            ProbeKind::Procfs => pid_file.with_probe(ProcTable::with_root(&self.proc_root)),
            ProbeKind::Signal => pid_file.with_probe(SignalProbe),
        }
    }

    /// Expand environment variables in configured paths
    fn expand_env_vars(&mut self) {
        self.pid_file = expand_env_in_path(&self.pid_file);
        self.logging_config = expand_env_in_path(&self.logging_config);
        self.proc_root = expand_env_in_path(&self.proc_root);
        if let Some(ref output) = self.output_file {
            self.output_file = Some(expand_env_in_path(output));
        }
    }
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand `$VAR` and `${VAR}` in a string. Unset variables stay as written.
fn expand_env_in_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        // (name, length of the token after the '$')
        let (name, len) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) if braced[..end].chars().all(is_var_char) => (&braced[..end], end + 2),
                _ => ("", 0),
            },
            None => {
                let end = after.find(|c: char| !is_var_char(c)).unwrap_or(after.len());
                (&after[..end], end)
            }
        };

        let token = &rest[pos..pos + 1 + len];
        let value = if name.is_empty() {
            None
        } else {
            std::env::var(name).ok()
        };
        result.push_str(value.as_deref().unwrap_or(token));
        rest = &rest[pos + 1 + len..];
    }

    result.push_str(rest);
    result
}

fn expand_env_in_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_in_string(&path.to_string_lossy()))
}
