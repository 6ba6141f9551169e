//! The control channel: an append-only text file. Every line is the name of a slot that should be refreshed right away.
//!
//! The daemon truncates the file at startup and tails it. Clients append `name\n`.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use cyanbar_shared_util::SlotName;
use tokio_util::sync::CancellationToken;

use crate::{bar::Bar, error::BarError, launcher::LauncherHandle};

/// Reads complete lines from the control file, starting at a cursor that only ever moves past complete lines.
#[derive(Debug)]
pub struct ControlReader {
    path: PathBuf,
    reader: BufReader<File>,
    cursor: u64,
}

impl ControlReader {
    /// Create or truncate the control file and start reading it from the beginning.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        File::create(path).with_context(|| format!("Failed to create control file {}", path.display()))?;
        let file = File::open(path).with_context(|| format!("Failed to open control file {}", path.display()))?;
        Ok(ControlReader { path: path.to_path_buf(), reader: BufReader::new(file), cursor: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next complete line past the cursor.
    /// Returns `None` if there is no new line yet, or the line is still being written.
    pub fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.reader.seek(SeekFrom::Start(self.cursor))?;
        let mut buf = Vec::new();
        let read = self.reader.read_until(b'\n', &mut buf)?;
        if read == 0 || buf.last() != Some(&b'\n') {
            return Ok(None);
        }
        self.cursor += read as u64;
        Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
    }
}

/// Append refresh requests for the given slots to the control file, in a single write.
pub fn append_requests(path: impl AsRef<Path>, names: &[SlotName]) -> Result<()> {
    let path = path.as_ref();
    let mut payload = String::new();
    for name in names {
        payload.push_str(name.as_str());
        payload.push('\n');
    }
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open control file {}", path.display()))?;
    file.write_all(payload.as_bytes()).context("Failed to write to control file")?;
    Ok(())
}

/// Tail the control file and handle every request in it, until cancelled.
/// Bad requests are ignored; the listener only stops when the bar is gone.
pub async fn run(
    bar: Bar,
    mut reader: ControlReader,
    poll_interval: Duration,
    launcher: Option<LauncherHandle>,
    token: CancellationToken,
) {
    log::debug!("Listening for requests on {}", reader.path().display());
    while !token.is_cancelled() {
        match reader.next_line() {
            Ok(Some(line)) => {
                if let Err(err) = handle_request(&bar, launcher.as_ref(), line).await {
                    if err.is_fatal() {
                        log::error!("Stopping control listener: {}", err);
                        break;
                    }
                    log::debug!("Ignoring control request: {}", err);
                }
                continue;
            }
            Ok(None) => {}
            Err(err) => log::warn!("Failed to read control file: {}", err),
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
    log::debug!("Control listener stopped");
}

async fn handle_request(bar: &Bar, launcher: Option<&LauncherHandle>, line: String) -> Result<(), BarError> {
    if line.is_empty() {
        return Ok(());
    }
    log::debug!("Received control request `{}`", line);
    match launcher {
        Some(launcher) if line == crate::launcher::LAUNCHER => {
            launcher.activate();
            Ok(())
        }
        _ => bar.refresh(SlotName(line)).await,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{bar::test_util::recording_bar, providers, registry::test_util::counting_slot};
    use std::sync::atomic::Ordering;

    #[test]
    fn test_partial_lines_are_not_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control");
        let mut reader = ControlReader::create(&path).unwrap();
        assert_eq!(reader.next_line().unwrap(), None);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"batt").unwrap();
        assert_eq!(reader.next_line().unwrap(), None);
        file.write_all(b"ery\nclock\n").unwrap();
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("battery"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("clock"));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_create_truncates_old_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control");
        std::fs::write(&path, "stale\n").unwrap();
        let mut reader = ControlReader::create(&path).unwrap();
        assert_eq!(reader.next_line().unwrap(), None);
        append_requests(&path, &["volume".into(), "network".into()]).unwrap();
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("volume"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("network"));
    }

    #[tokio::test]
    async fn test_listener_refreshes_requested_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control");
        let reader = ControlReader::create(&path).unwrap();

        let (battery, calls) = counting_slot(providers::BATTERY, "b");
        let (bar, sink, _) = recording_bar(vec![battery]);
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(bar, reader, Duration::from_millis(50), None, token.clone()));

        append_requests(&path, &["nonsense".into()]).unwrap();
        append_requests(&path, &["battery".into()]).unwrap();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) == 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        token.cancel();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // the unknown request did not cause a redraw
        assert_eq!(sink.lines().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_is_handled_within_one_poll_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control");
        let reader = ControlReader::create(&path).unwrap();

        let (battery, calls) = counting_slot(providers::BATTERY, "b");
        let (bar, _sink, _) = recording_bar(vec![battery]);
        let token = CancellationToken::new();
        let poll_interval = Duration::from_millis(50);
        let handle = tokio::spawn(run(bar, reader, poll_interval, None, token.clone()));
        // let the listener find the file empty and go to sleep
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let start = tokio::time::Instant::now();
        append_requests(&path, &["battery".into()]).unwrap();
        tokio::time::advance(poll_interval).await;

        // the update runs on a blocking thread, wait for it without letting the clock move
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            tokio::task::yield_now().await;
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(tokio::time::Instant::now() - start <= poll_interval);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_launcher_request_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control");
        let reader = ControlReader::create(&path).unwrap();
        let (bar, _sink, _) = recording_bar(vec![]);
        let (launcher, mut activations) = LauncherHandle::new();
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(bar, reader, Duration::from_millis(10), Some(launcher), token.clone()));

        append_requests(&path, &[crate::launcher::LAUNCHER.into()]).unwrap();
        let activation = tokio::time::timeout(Duration::from_secs(5), activations.recv()).await.unwrap();
        assert_eq!(activation, Some(()));
        token.cancel();
        handle.await.unwrap();
    }
}
