//! Single-instance process lock
//!
//! The `crawl` command holds a lock file containing its PID for as long as it
//! runs. The file is created atomically and removed when the lock drops.

use crate::{ProspectorError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Exclusive lock held through a PID file
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// Acquires the lock at `path`
    ///
    /// A lock file left behind by a process that no longer exists is replaced
    /// once.
    ///
    /// # Returns
    ///
    /// * `Ok(InstanceLock)` - Lock acquired
    /// * `Err(ProspectorError::InstanceLocked)` - Another live instance holds it
    /// * `Err(ProspectorError::Io)` - The lock file could not be created
    pub fn acquire(path: &Path) -> Result<Self> {
        match create_lock_file(path) {
            Ok(()) => return Ok(Self::held(path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        let holder = fs::read_to_string(path)
            .ok()
            .and_then(|contents| contents.trim().parse::<u32>().ok());
        if holder.map_or(true, process_exists) {
            return Err(ProspectorError::InstanceLocked(path.to_path_buf()));
        }

        tracing::warn!(path = %path.display(), "Removing stale lock file");
        fs::remove_file(path)?;
        match create_lock_file(path) {
            Ok(()) => Ok(Self::held(path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(ProspectorError::InstanceLocked(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn held(path: &Path) -> Self {
        tracing::debug!(path = %path.display(), "Instance lock acquired");
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), "Failed to remove lock file: {}", e);
        }
    }
}

fn create_lock_file(path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{}", std::process::id())
}

fn process_exists(pid: u32) -> bool {
    let proc_root = Path::new("/proc");
    if proc_root.is_dir() {
        proc_root.join(pid.to_string()).exists()
    } else {
        // cannot tell, assume alive
        true
    }
}
