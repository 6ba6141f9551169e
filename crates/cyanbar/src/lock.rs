//! Makes sure only one daemon runs at a time.
//!
//! An exclusive advisory lock on the lock file is held for the whole lifetime of the daemon,
//! and the pid file tells clients which process to signal.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use nix::{
    errno::Errno,
    fcntl::{Flock, FlockArg},
    unistd::Pid,
};

#[derive(Debug)]
pub struct InstanceLock {
    _lock: Flock<File>,
    lock_file: PathBuf,
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))
}

fn try_lock(path: &Path) -> Result<Option<Flock<File>>> {
    match Flock::lock(open_lock_file(path)?, FlockArg::LockExclusiveNonblock) {
        Ok(lock) => Ok(Some(lock)),
        Err((_, Errno::EWOULDBLOCK)) => Ok(None),
        Err((_, errno)) => Err(errno).with_context(|| format!("Failed to lock {}", path.display())),
    }
}

impl InstanceLock {
    /// Take the lock and record the pid of the current process.
    /// Returns `None` when another process holds the lock, in which case the pid file is left alone.
    pub fn acquire(lock_file: &Path, pid_file: &Path) -> Result<Option<Self>> {
        let Some(lock) = try_lock(lock_file)? else {
            return Ok(None);
        };
        let pid = std::process::id();
        let mut file = File::create(pid_file).with_context(|| format!("Failed to create pid file {}", pid_file.display()))?;
        write!(file, "{}", pid)?;
        log::debug!("Acquired {} (pid {})", lock_file.display(), pid);
        Ok(Some(InstanceLock { _lock: lock, lock_file: lock_file.to_path_buf() }))
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        log::debug!("Releasing {}", self.lock_file.display());
    }
}

/// Whether some process currently holds the lock.
pub fn is_locked(lock_file: &Path) -> Result<bool> {
    // a successful probe unlocks again when the guard is dropped
    Ok(try_lock(lock_file)?.is_none())
}

pub fn read_pid(pid_file: &Path) -> Result<Pid> {
    let content = std::fs::read_to_string(pid_file).with_context(|| format!("Failed to read pid file {}", pid_file.display()))?;
    let pid = content.trim().parse().with_context(|| format!("Invalid pid `{}` in {}", content.trim(), pid_file.display()))?;
    Ok(Pid::from_raw(pid))
}
