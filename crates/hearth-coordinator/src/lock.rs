// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-wide named lock backed by `flock(2)`.
//!
//! The lock lives on `<dir>/<name>.lock`. Every open file description gets
//! its own lock, so two acquisitions conflict even within one process. The
//! kernel drops the lock when the holder closes the file or dies.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::debug;

use hearth_config::model::ElectionConfig;
use hearth_core::{HearthError, LockLease, NamedLock};

/// Named exclusive lock on a file in a shared directory.
#[derive(Debug, Clone)]
pub struct FileLock {
    name: String,
    path: PathBuf,
}

impl FileLock {
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = dir.as_ref().join(format!("{name}.lock"));
        Self { name, path }
    }

    pub fn from_config(config: &ElectionConfig) -> Self {
        Self::new(&config.lock_dir, config.lock_name.clone())
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether some actor currently holds the lock, without taking it.
    pub fn is_held(&self) -> Result<bool, HearthError> {
        // Checking means briefly taking it; the lease drops immediately.
        Ok(self.try_acquire()?.is_none())
    }

    fn lock_err(&self, source: io::Error) -> HearthError {
        HearthError::Lock {
            name: self.name.clone(),
            source,
        }
    }
}

impl NamedLock for FileLock {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_acquire(&self) -> Result<Option<LockLease>, HearthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.lock_err(e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.lock_err(e))?;

        match lock_exclusive_nonblocking(file).map_err(|e| self.lock_err(e))? {
            Some(guard) => {
                debug!(lock = %self.name, path = %self.path.display(), "lock acquired");
                Ok(Some(LockLease::new(self.name.clone(), guard)))
            }
            None => Ok(None),
        }
    }
}

/// Take `LOCK_EX | LOCK_NB` on `file`. `None` when someone else holds it.
///
/// The returned guard unlocks and closes the file on drop.
fn lock_exclusive_nonblocking(mut file: File) -> io::Result<Option<Flock<File>>> {
    loop {
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(guard) => return Ok(Some(guard)),
            Err((returned, Errno::EINTR)) => file = returned,
            Err((_, Errno::EWOULDBLOCK)) => return Ok(None),
            Err((_, errno)) => return Err(io::Error::from(errno)),
        }
    }
}
