use std::{process::Stdio, time::Duration};

use anyhow::{bail, Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command},
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

/// The process that paints the bar.
pub trait BarSink: Send + Sync {
    /// Write one complete line to the bar. Concurrent pushes never interleave.
    /// Called from blocking threads, never from within the async runtime.
    fn push(&self, line: &str) -> std::io::Result<()>;
}

/// A running lemonbar (or compatible) process.
/// Rendered lines are written to its stdin, clicked actions are read from its stdout.
pub struct LemonbarProcess {
    child: tokio::sync::Mutex<Child>,
    stdin: tokio::sync::Mutex<ChildStdin>,
    runtime: Handle,
    write_timeout: Duration,
}

impl LemonbarProcess {
    /// Start the bar process. Returns the process and a channel of the action lines it prints.
    /// The channel closes once the bar closes its stdout, which happens when it exits.
    /// A push that can't be written within `write_timeout` fails, the bar is considered stalled.
    pub fn spawn(command: &[String], write_timeout: Duration) -> Result<(Self, UnboundedReceiver<String>)> {
        let Some((program, args)) = command.split_first() else {
            bail!("The bar command is empty");
        };
        log::info!("Starting bar: {}", command.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start the bar `{}`", program))?;
        let stdin = child.stdin.take().context("Bar process has no stdin")?;
        let stdout = child.stdout.take().context("Bar process has no stdout")?;

        let (action_send, action_recv) = mpsc::unbounded_channel();
        tokio::spawn(forward_actions(stdout, action_send));

        let process = LemonbarProcess {
            child: tokio::sync::Mutex::new(child),
            stdin: tokio::sync::Mutex::new(stdin),
            runtime: Handle::current(),
            write_timeout,
        };
        Ok((process, action_recv))
    }

    /// Kill the bar process if it is still running, and reap it.
    pub async fn terminate(&self) {
        let mut child = self.child.lock().await;
        match child.try_wait() {
            Ok(Some(status)) => log::debug!("Bar already exited with {}", status),
            _ => {
                log::debug!("Killing bar process {:?}", child.id());
                if let Err(err) = child.kill().await {
                    log::debug!("Failed to kill the bar: {}", err);
                }
            }
        }
    }

    async fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await
    }
}

async fn forward_actions(stdout: ChildStdout, send: UnboundedSender<String>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if send.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                log::error!("Failed to read from the bar: {}", err);
                break;
            }
        }
    }
    log::debug!("Bar closed its output");
}

impl BarSink for LemonbarProcess {
    fn push(&self, line: &str) -> std::io::Result<()> {
        // the deadline covers waiting for the lock too, so pushes queued behind a stalled one fail as well
        let write = tokio::time::timeout(self.write_timeout, self.write_line(line));
        match self.runtime.block_on(write) {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("the bar did not accept a line within {:?}", self.write_timeout),
            )),
        }
    }
}


#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;

    const WRITE_TIMEOUT: Duration = Duration::from_millis(200);

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lines_roundtrip_through_cat() {
        let (bar, mut actions) = LemonbarProcess::spawn(&["cat".to_string()], WRITE_TIMEOUT).unwrap();
        let bar = Arc::new(bar);
        {
            let bar = bar.clone();
            tokio::task::spawn_blocking(move || bar.push("xdotool windowactivate 42")).await.unwrap().unwrap();
        }
        assert_eq!(actions.recv().await.as_deref(), Some("xdotool windowactivate 42"));
        bar.terminate().await;
        assert_eq!(actions.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stalled_bar_times_out() {
        let (bar, _actions) = LemonbarProcess::spawn(&["sleep".to_string(), "30".to_string()], WRITE_TIMEOUT).unwrap();
        let bar = Arc::new(bar);
        let pushing = {
            let bar = bar.clone();
            tokio::task::spawn_blocking(move || -> std::io::Result<()> {
                let line = "x".repeat(1000);
                // the pipe buffer fills up after a few dozen lines at most
                for _ in 0..10_000 {
                    bar.push(&line)?;
                }
                Ok(())
            })
        };
        let result: std::io::Result<()> =
            tokio::time::timeout(Duration::from_secs(5), pushing).await.expect("push blocked on a stalled bar").unwrap();
        assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::TimedOut);
        bar.terminate().await;
    }

    #[tokio::test]
    async fn test_dropping_the_process_kills_the_bar() {
        let (bar, mut actions) = LemonbarProcess::spawn(&["sleep".to_string(), "30".to_string()], WRITE_TIMEOUT).unwrap();
        drop(bar);
        // the output only closes once the bar is gone
        let closed = tokio::time::timeout(Duration::from_secs(5), actions.recv()).await.unwrap();
        assert_eq!(closed, None);
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        assert!(LemonbarProcess::spawn(&[], WRITE_TIMEOUT).is_err());
    }
}
