// PID file management for single-instance enforcement

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default PID file location
const DEFAULT_PID_FILE: &str = "/tmp/daemon-guard.pid";

/// Default root of the live-process registry
pub const DEFAULT_PROC_ROOT: &str = "/proc";

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Answers whether a process identifier belongs to a live process
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Liveness probe backed by a `/proc`-style directory keyed by PID.
///
/// A process is alive when `<root>/<pid>` exists.
#[derive(Debug, Clone)]
pub struct ProcTable {
    root: PathBuf,
}

impl ProcTable {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_PROC_ROOT)
    }

    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for ProcTable {
    fn is_alive(&self, pid: u32) -> bool {
        let entry = self.root.join(pid.to_string());
        let alive = entry.exists();
        debug!("Probed {}: alive={}", entry.display(), alive);
        alive
    }
}

/// Liveness probe that sends signal 0, for hosts without `/proc`
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalProbe;

impl ProcessProbe for SignalProbe {
    #[cfg(unix)]
    fn is_alive(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // Out-of-range values would address process groups
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }

        match kill(Pid::from_raw(raw), None::<Signal>) {
            Ok(()) => true,
            Err(Errno::ESRCH) => false,
            Err(Errno::EPERM) => true, // exists, owned by someone else
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    fn is_alive(&self, _pid: u32) -> bool {
        // No cheap probe here; assume the recorded owner is alive
        true
    }
}

fn default_probe() -> Box<dyn ProcessProbe> {
    if cfg!(target_os = "linux") {
        Box::new(ProcTable::new())
    } else {
        Box::new(SignalProbe)
    }
}

/// How acquisition behaves when it finds a stale marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Upper bound on how often a blocking marker is cleared before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fail immediately instead of retrying when a stale marker can't be removed
    #[serde(default)]
    pub abort_on_remove_failure: bool,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            abort_on_remove_failure: false,
        }
    }
}

/// Outcome of a successful acquisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acquisition {
    /// PID written into the marker (our own)
    pub pid: u32,
    /// Number of create attempts it took
    pub attempts: u32,
    /// PIDs of dead owners whose markers were removed on the way
    pub reclaimed: Vec<u32>,
    /// Stale markers that could not be removed, tolerated by the policy
    pub remove_failures: Vec<String>,
}

/// What the marker file currently says
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum PidStatus {
    Absent,
    Running(u32),
    Stale(u32),
    Corrupt(String),
}

/// Manages the daemon PID file
pub struct PidFile {
    path: PathBuf,
    probe: Box<dyn ProcessProbe>,
    policy: RetryPolicy,
}

impl PidFile {
    /// Create a new PID file manager with default path
    pub fn new() -> Self {
        Self::with_path(DEFAULT_PID_FILE)
    }

    /// Create a new PID file manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            probe: default_probe(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_probe<P: ProcessProbe + 'static>(mut self, probe: P) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Claim the single-instance slot for the current process.
    ///
    /// A marker left by a dead owner is removed and creation is retried.
    /// `max_attempts` bounds how many times a blocking marker is dealt with;
    /// every clearing is followed by another create attempt. A live owner
    /// or unparseable content is reported as an error and the marker is
    /// left untouched.
    pub fn acquire(&self) -> Result<Acquisition> {
        let pid = std::process::id();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut reclaimed = Vec::new();
        let mut remove_failures = Vec::new();
        let mut cleared = 0;

        loop {
            match self.create_exclusive() {
                Ok(file) => {
                    self.write_owner(file, pid)?;
                    debug!(
                        "Wrote PID {} to {} (attempt {})",
                        pid,
                        self.path.display(),
                        cleared + 1
                    );
                    return Ok(Acquisition {
                        pid,
                        attempts: cleared + 1,
                        reclaimed,
                        remove_failures,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(GuardError::Io(e)),
            }

            if cleared == max_attempts {
                return Err(GuardError::RetriesExhausted {
                    path: self.path.clone(),
                    attempts: max_attempts,
                });
            }
            cleared += 1;

            match self.status()? {
                // Vanished between create and read
                PidStatus::Absent => {}
                PidStatus::Running(owner) => {
                    return Err(GuardError::AlreadyRunning {
                        pid: owner,
                        path: self.path.clone(),
                    });
                }
                PidStatus::Corrupt(content) => {
                    return Err(GuardError::CorruptPidFile {
                        path: self.path.clone(),
                        content,
                    });
                }
                PidStatus::Stale(owner) => {
                    info!("No process exists with PID: {}", owner);
                    if self.remove_stale(&mut remove_failures)? {
                        reclaimed.push(owner);
                    }
                }
            }
        }
    }

    /// Read the PID from the file
    pub fn read(&self) -> Result<u32> {
        let content = self.read_content()?.ok_or_else(|| GuardError::PidFileUnreadable {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "PID file does not exist"),
        })?;

        parse_pid(&content).ok_or_else(|| GuardError::CorruptPidFile {
            path: self.path.clone(),
            content,
        })
    }

    /// Inspect the marker and probe its recorded owner
    pub fn status(&self) -> Result<PidStatus> {
        let Some(content) = self.read_content()? else {
            return Ok(PidStatus::Absent);
        };

        let status = match parse_pid(&content) {
            None => PidStatus::Corrupt(content),
            Some(owner) if self.probe.is_alive(owner) => PidStatus::Running(owner),
            Some(owner) => PidStatus::Stale(owner),
        };
        Ok(status)
    }

    /// Check if the PID file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the PID file. Absence is not an error.
    pub fn release(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GuardError::Io(e)),
        }
    }

    /// Get the path to the PID file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn create_exclusive(&self) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        options.open(&self.path)
    }

    fn write_owner(&self, mut file: File, pid: u32) -> Result<()> {
        if let Err(e) = write!(file, "{}", pid) {
            drop(file);
            // Don't leave an empty marker behind for the next starter to trip on
            let _ = fs::remove_file(&self.path);
            return Err(GuardError::Io(e));
        }
        Ok(())
    }

    fn read_content(&self) -> Result<Option<String>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(GuardError::PidFileUnreadable {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Returns whether this call removed the marker. Failures that the
    /// policy tolerates are pushed onto `failures`.
    fn remove_stale(&self, failures: &mut Vec<String>) -> Result<bool> {
        warn!("Removing PID file: {}", self.path.display());
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => {
                warn!("Failed to remove PID file: {}", source);
                if self.policy.abort_on_remove_failure {
                    return Err(GuardError::StaleRemoval {
                        path: self.path.clone(),
                        source,
                    });
                }
                failures.push(format!("{}: {}", self.path.display(), source));
                Ok(false)
            }
        }
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse marker content: decimal digits only, non-zero
fn parse_pid(content: &str) -> Option<u32> {
    if content.is_empty() || !content.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    content.parse::<u32>().ok().filter(|pid| *pid > 0)
}
