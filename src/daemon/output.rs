// Output file rotation and stdout/stderr redirection

use crate::error::{GuardError, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix format for rotated output files: `<path>.2024-05-01_13:45:09`
const ROTATION_STAMP: &str = "%Y-%m-%d_%H:%M:%S";

const STDOUT_FD: i32 = 1;
const STDERR_FD: i32 = 2;

/// Name an existing output file is moved to when rotated at `at`
pub fn rotated_path(path: &Path, at: &DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(at.format(ROTATION_STAMP).to_string());
    PathBuf::from(name)
}

/// Move whatever exists at `path` aside to its timestamped name.
///
/// Returns the rotated path, or `None` if there was nothing to rotate.
/// Empty files are rotated too.
pub fn rotate_existing(path: &Path, at: &DateTime<Local>) -> Result<Option<PathBuf>> {
    match fs::symlink_metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GuardError::Io(e)),
    }

    let target = rotated_path(path, at);
    fs::rename(path, &target).map_err(|source| GuardError::Rotation {
        from: path.to_path_buf(),
        to: target.clone(),
        source,
    })?;

    Ok(Some(target))
}

/// The open output file. Dropping it does not undo the redirection, but
/// keep it for the process lifetime anyway so the descriptor stays owned.
#[derive(Debug)]
pub struct OutputFile {
    file: File,
    path: PathBuf,
    rotated: Option<PathBuf>,
}

impl OutputFile {
    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the previous output was moved, if there was any
    pub fn rotated(&self) -> Option<&Path> {
        self.rotated.as_deref()
    }
}

/// Rotates the previous output file and binds descriptors to a fresh one
#[derive(Debug, Clone)]
pub struct OutputRedirector {
    path: PathBuf,
    targets: Vec<i32>,
}

impl OutputRedirector {
    /// Redirect stdout and stderr to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            targets: vec![STDOUT_FD, STDERR_FD],
        }
    }

    /// Replace the descriptors that get rebound to the output file
    pub fn with_targets(mut self, targets: Vec<i32>) -> Self {
        self.targets = targets;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn attach(&self) -> Result<OutputFile> {
        self.attach_at(&Local::now())
    }

    /// Like [`attach`](Self::attach) with an explicit rotation timestamp
    pub fn attach_at(&self, at: &DateTime<Local>) -> Result<OutputFile> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let rotated = rotate_existing(&self.path, at)?;
        let file = open_sync(&self.path)?;

        // Anything still buffered belongs to the old destination
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        redirect(&file, &self.targets)?;

        Ok(OutputFile {
            file,
            path: self.path.clone(),
            rotated,
        })
    }
}

/// Rotate any previous output at `path` and send stdout/stderr there
pub fn attach_output<P: AsRef<Path>>(path: P) -> Result<OutputFile> {
    OutputRedirector::new(path).attach()
}

fn open_sync(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644).custom_flags(nix::libc::O_SYNC);
    }
    options.open(path).map_err(|e| {
        GuardError::Redirect(format!("Failed to open out file {}: {}", path.display(), e))
    })
}

#[cfg(unix)]
fn redirect(file: &File, targets: &[i32]) -> Result<()> {
    use nix::errno::Errno;
    use nix::libc;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    for &target in targets {
        // SAFETY: `fd` is owned by `file` and outlives the call; dup2 only
        // replaces `target` in the descriptor table.
        let rc = unsafe { libc::dup2(fd, target) };
        Errno::result(rc).map_err(|e| {
            GuardError::Redirect(format!("dup2 onto descriptor {} failed: {}", target, e))
        })?;
    }

    Ok(())
}

#[cfg(not(unix))]
fn redirect(_file: &File, _targets: &[i32]) -> Result<()> {
    Err(GuardError::Redirect(
        "Output redirection is only supported on Unix systems".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 13, 45, 9).unwrap()
    }

    #[test]
    fn test_rotated_path_format() {
        let rotated = rotated_path(Path::new("/var/log/burrow.out"), &fixed_time());
        assert_eq!(
            rotated,
            PathBuf::from("/var/log/burrow.out.2024-05-01_13:45:09")
        );
    }

    #[test]
    fn test_rotate_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daemon.out");

        assert!(rotate_existing(&path, &fixed_time()).unwrap().is_none());
    }

    #[test]
    fn test_rotate_keeps_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daemon.out");
        fs::write(&path, "previous run\n").unwrap();

        let rotated = rotate_existing(&path, &fixed_time()).unwrap().unwrap();

        assert!(!path.exists());
        assert_eq!(fs::read_to_string(rotated).unwrap(), "previous run\n");
    }

    #[test]
    fn test_rotate_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daemon.out");
        File::create(&path).unwrap();

        let rotated = rotate_existing(&path, &fixed_time()).unwrap();
        assert!(rotated.is_some());
    }

    #[test]
    fn test_redirector_targets_default_to_std_streams() {
        let redirector = OutputRedirector::new("/tmp/x.out");
        assert_eq!(redirector.targets, vec![STDOUT_FD, STDERR_FD]);
    }
}
