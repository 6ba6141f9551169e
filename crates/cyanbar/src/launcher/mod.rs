//! The launcher: an interactive text prompt in the bar that launches the typed command.
//!
//! While it captures the keyboard, the window list is hidden and the launcher slot shows the prompt.

pub mod focus;
pub mod input;
pub mod keys;
pub mod session;

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use cyanbar_shared_util::markup;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::{bar::Bar, error::BarError, providers, registry::CacheSlot};
use focus::FocusControl;
use input::KeySource;
use session::{LauncherSession, Outcome};

/// Name of the launcher slot. Requesting an update of this name on the control channel opens the launcher.
pub const LAUNCHER: &str = "launcher";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Capturing,
    Submitting,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct LauncherState {
    phase: Phase,
    session: Option<LauncherSession>,
}

impl LauncherState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The text the launcher slot shows: the prompt while capturing, nothing otherwise.
    pub fn prompt(&self) -> String {
        match (self.phase, &self.session) {
            (Phase::Capturing, Some(session)) => markup::reversed(&format!(" > {}_ ", markup::escape(&session.buffer))),
            _ => String::new(),
        }
    }
}

pub type SharedState = Arc<Mutex<LauncherState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, LauncherState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The interactive slot that shows the launcher prompt.
pub fn slot(state: SharedState) -> CacheSlot {
    CacheSlot::new(LAUNCHER, move || Ok(lock(&state).prompt())).interactive()
}

/// Sends activation requests to a running launcher.
#[derive(Debug, Clone)]
pub struct LauncherHandle {
    send: UnboundedSender<()>,
}

impl LauncherHandle {
    pub fn new() -> (Self, UnboundedReceiver<()>) {
        let (send, recv) = mpsc::unbounded_channel();
        (LauncherHandle { send }, recv)
    }

    pub fn activate(&self) {
        crate::print_result_err!("while activating the launcher", self.send.send(()));
    }
}

/// Launches a command without waiting for it.
pub type SpawnFn = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

pub struct Launcher {
    bar: Bar,
    state: SharedState,
    keys: Arc<dyn KeySource>,
    focus: Arc<dyn FocusControl>,
    spawn: SpawnFn,
    /// Delay before the window list is refreshed after the launcher closed.
    grace: Duration,
}

impl Launcher {
    pub fn new(
        bar: Bar,
        state: SharedState,
        keys: Arc<dyn KeySource>,
        focus: Arc<dyn FocusControl>,
        grace: Duration,
    ) -> Self {
        let spawn: SpawnFn = Arc::new(|command: &str| crate::process::spawn_detached(command).map(drop));
        Launcher { bar, state, keys, focus, spawn, grace }
    }

    pub fn with_spawner(mut self, spawn: SpawnFn) -> Self {
        self.spawn = spawn;
        self
    }

    /// Run a launcher session for every activation request, until cancelled.
    pub async fn run(self, mut activations: UnboundedReceiver<()>, token: CancellationToken) {
        crate::loop_select_cancellable!(token,
            activation = activations.recv() => {
                if activation.is_none() {
                    break;
                }
                if let Err(err) = self.run_session(&token).await {
                    if err.is_fatal() {
                        log::error!("Stopping launcher: {}", err);
                        break;
                    }
                    log::warn!("Launcher session failed: {}", err);
                }
                // activations that came in while the launcher was open are dropped
                while activations.try_recv().is_ok() {}
            }
        );
        log::debug!("Launcher stopped");
    }

    async fn run_session(&self, token: &CancellationToken) -> Result<(), BarError> {
        let mut capture = match self.keys.capture() {
            Ok(capture) => capture,
            Err(err) => {
                log::error!("Failed to capture the keyboard: {:?}", err);
                return Ok(());
            }
        };
        log::debug!("Opening launcher");
        {
            let mut state = lock(&self.state);
            state.phase = Phase::Capturing;
            state.session = Some(LauncherSession::new());
        }
        if let Err(err) = self.bar.registry().hide(providers::APPS) {
            log::debug!("Not hiding the window list: {}", err);
        }
        let focus = self.focus.clone();
        let previous_window = tokio::task::spawn_blocking(move || {
            let previous = focus.active_window();
            focus.focus_bar();
            previous
        })
        .await?;

        let outcome = match self.bar.refresh(LAUNCHER.into()).await {
            Err(err) if err.is_fatal() => Outcome::Cancel,
            _ => loop {
                let event = tokio::select! {
                    _ = token.cancelled() => break Outcome::Cancel,
                    event = capture.events.recv() => event,
                };
                let Some(event) = event else {
                    log::warn!("Keyboard capture ended unexpectedly");
                    break Outcome::Cancel;
                };
                let outcome = match lock(&self.state).session.as_mut() {
                    Some(session) => session.handle(event),
                    None => Outcome::Cancel,
                };
                if let Err(err) = self.bar.refresh(LAUNCHER.into()).await {
                    if err.is_fatal() {
                        break Outcome::Cancel;
                    }
                }
                if outcome != Outcome::Continue {
                    break outcome;
                }
            },
        };
        drop(capture);

        let buffer = {
            let mut state = lock(&self.state);
            state.phase = if outcome == Outcome::Submit { Phase::Submitting } else { Phase::Cancelled };
            state.session.take().map(|session| session.buffer).unwrap_or_default()
        };
        if outcome == Outcome::Submit {
            self.submit(buffer.trim());
        } else {
            log::debug!("Launcher cancelled");
        }
        self.cleanup(previous_window, token).await
    }

    fn submit(&self, command: &str) {
        if command.is_empty() {
            log::debug!("Nothing to launch");
            return;
        }
        log::info!("Launching `{}`", command);
        if let Err(err) = (self.spawn)(command) {
            log::error!("Failed to launch `{}`: {}", command, err);
        }
    }

    async fn cleanup(&self, previous_window: Option<String>, token: &CancellationToken) -> Result<(), BarError> {
        if let Some(window) = previous_window {
            let focus = self.focus.clone();
            tokio::task::spawn_blocking(move || focus.restore(&window)).await?;
        }
        lock(&self.state).phase = Phase::Idle;
        if let Err(err) = self.bar.registry().unhide(providers::APPS) {
            log::debug!("Not showing the window list: {}", err);
        }
        self.bar.refresh(LAUNCHER.into()).await?;

        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = tokio::time::sleep(self.grace) => {}
        }
        // the launched command may have opened a window
        match self.bar.refresh(providers::APPS.into()).await {
            Err(BarError::Registry(err)) => {
                log::debug!("Not refreshing the window list: {}", err);
                Ok(())
            }
            result => result,
        }
    }
}
