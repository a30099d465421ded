use std::{
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{Error, Result};

pub const DEFAULT_LOCK_FILE: &str = "/var/lock/kd-master-backup.lock";

/// Held for the whole of one backup or restore run. Dropping the guard removes
/// the marker, including while unwinding from a panic.
#[derive(Debug)]
pub struct ExclusivityGuard {
    path: PathBuf,
}

impl ExclusivityGuard {
    /// Create the marker or fail with [`Error::AlreadyRunning`] if it exists.
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => {
                debug!(lock = %path.display(), "lock acquired");
                Ok(Self {
                    path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(Error::AlreadyRunning(path.display().to_string()).into())
            }
            Err(err) => Err(Error::Io(err).into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ExclusivityGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(lock = %self.path.display(), "lock released"),
            Err(err) => warn!(
                lock = %self.path.display(),
                error = %err,
                "failed to remove lock marker; remove it manually before the next run"
            ),
        }
    }
}

/// Run `f` while holding the marker at `path`.
pub fn with_lock<T, F>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let _guard = ExclusivityGuard::acquire(path)?;
    f()
}
