use std::{collections::HashSet, process::Stdio};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use super::keys::{self, Edge, Key, KeyEvent};

/// A stream of raw keyboard events, owned by the launcher for as long as it captures input.
/// Dropping the capture stops the underlying reader.
pub struct KeyCapture {
    pub events: UnboundedReceiver<KeyEvent>,
    _process: Option<tokio::process::Child>,
}

impl KeyCapture {
    pub fn from_channel(events: UnboundedReceiver<KeyEvent>) -> Self {
        KeyCapture { events, _process: None }
    }
}

/// Something that can hand out exclusive keyboard captures.
pub trait KeySource: Send + Sync {
    fn capture(&self) -> Result<KeyCapture>;
}

/// Reads key events of one keyboard device through `xinput test`.
#[derive(Debug, Clone)]
pub struct XinputKeySource {
    device: String,
}

impl XinputKeySource {
    pub fn new(device: impl Into<String>) -> Self {
        XinputKeySource { device: device.into() }
    }
}

impl KeySource for XinputKeySource {
    fn capture(&self) -> Result<KeyCapture> {
        log::debug!("Capturing keyboard `{}`", self.device);
        let mut child = tokio::process::Command::new("xinput")
            .args(["test", &self.device])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start `xinput test {}`", self.device))?;
        let stdout = child.stdout.take().context("xinput has no stdout")?;

        let (send, recv) = mpsc::unbounded_channel();
        tokio::spawn(forward_xinput_events(BufReader::new(stdout), send));
        Ok(KeyCapture { events: recv, _process: Some(child) })
    }
}

async fn forward_xinput_events<R>(reader: BufReader<R>, send: UnboundedSender<KeyEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    let mut held = HashSet::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(event) = parse_xinput_line(&line, &mut held) else {
                    continue;
                };
                if send.send(event).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                log::warn!("Failed to read keyboard events: {}", err);
                break;
            }
        }
    }
}

/// Parse one line of `xinput test` output, like `key press   41` or `key release 41`.
/// xinput reports auto-repeat as repeated presses, so presses of keys that are already held count as repeats.
fn parse_xinput_line(line: &str, held: &mut HashSet<Key>) -> Option<KeyEvent> {
    let mut words = line.split_whitespace();
    if words.next()? != "key" {
        return None;
    }
    let kind = words.next()?;
    let key = keys::from_x11_keycode(words.next()?.parse().ok()?)?;
    let edge = match kind {
        "press" if held.insert(key) => Edge::Press,
        "press" => Edge::Repeat,
        "release" => {
            held.remove(&key);
            Edge::Release
        }
        _ => return None,
    };
    Some(KeyEvent { key, edge })
}
