use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cyanbar_shared_util::SlotName;
use nix::sys::signal::{self, Signal};

use crate::{control, error::DaemonStateError, lock, paths::CyanbarPaths};

/// How long a daemon gets to shut down cleanly before it is killed.
pub const KILL_TIMEOUT: Duration = Duration::from_secs(2);

pub fn kill_daemon(paths: &CyanbarPaths) -> Result<()> {
    kill_daemon_within(paths, KILL_TIMEOUT)
}

/// Ask the running daemon to stop, and kill it if it still holds the lock after `timeout`.
fn kill_daemon_within(paths: &CyanbarPaths, timeout: Duration) -> Result<()> {
    if !lock::is_locked(paths.get_lock_file())? {
        return Err(DaemonStateError::NotRunning.into());
    }
    let pid = lock::read_pid(paths.get_pid_file())?;
    log::debug!("Sending SIGTERM to cyanbar ({})", pid);
    signal::kill(pid, Signal::SIGTERM).with_context(|| format!("Failed to signal cyanbar ({})", pid))?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !lock::is_locked(paths.get_lock_file())? {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    log::warn!("cyanbar ({}) did not stop within {:?}, killing it", pid, timeout);
    signal::kill(pid, Signal::SIGKILL).with_context(|| format!("Failed to kill cyanbar ({})", pid))?;
    Ok(())
}

/// Ask the running daemon to refresh the given slots right away.
pub fn send_update(paths: &CyanbarPaths, names: &[SlotName]) -> Result<()> {
    if !lock::is_locked(paths.get_lock_file())? {
        return Err(DaemonStateError::NotRunning.into());
    }
    log::debug!("Requesting update of {:?}", names);
    control::append_requests(paths.get_control_file(), names)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lock::InstanceLock;
    use std::os::unix::process::ExitStatusExt;

    fn paths(dir: &tempfile::TempDir) -> CyanbarPaths {
        CyanbarPaths::from_state_dir(dir.path(), Some(dir.path().join("cyanbar.json"))).unwrap()
    }

    #[test]
    fn test_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let err = kill_daemon(&paths).unwrap_err();
        assert_eq!(err.downcast_ref::<DaemonStateError>(), Some(&DaemonStateError::NotRunning));
        let err = send_update(&paths, &[SlotName::from("clock")]).unwrap_err();
        assert_eq!(err.downcast_ref::<DaemonStateError>(), Some(&DaemonStateError::NotRunning));
        assert!(!paths.get_control_file().exists());
    }

    #[test]
    fn test_update_appends_to_control_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let _lock = InstanceLock::acquire(paths.get_lock_file(), paths.get_pid_file()).unwrap().unwrap();
        std::fs::write(paths.get_control_file(), "apps\n").unwrap();
        send_update(&paths, &[SlotName::from("battery"), SlotName::from("clock")]).unwrap();
        assert_eq!(std::fs::read_to_string(paths.get_control_file()).unwrap(), "apps\nbattery\nclock\n");
    }

    #[test]
    fn test_kill_signals_recorded_pid() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let _lock = InstanceLock::acquire(paths.get_lock_file(), paths.get_pid_file()).unwrap().unwrap();
        let mut victim = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        std::fs::write(paths.get_pid_file(), victim.id().to_string()).unwrap();

        // the lock stays held by this process, so the kill escalates after the timeout
        kill_daemon_within(&paths, Duration::from_millis(200)).unwrap();
        assert_eq!(victim.wait().unwrap().signal(), Some(Signal::SIGTERM as i32));
    }
}
