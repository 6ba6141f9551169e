use std::time::Duration;

use cyanbar_shared_util::SlotName;

/// Failure of a single provider. These never leave the slot that produced them;
/// the slot logs them and falls back to its failure policy.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: std::process::ExitStatus },

    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Unexpected output: {0}")]
    Parse(String),

    #[error("{0} is unavailable")]
    Unavailable(String),
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("No slot named `{0}` is registered")]
    UnknownSlot(SlotName),

    #[error("A slot named `{0}` is already registered")]
    DuplicateSlot(SlotName),
}

/// Errors that may occur while refreshing a slot and redrawing the bar.
#[derive(thiserror::Error, Debug)]
pub enum BarError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to write to the bar: {0}")]
    Sink(#[source] std::io::Error),

    #[error("Background refresh task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl BarError {
    /// Whether the daemon can keep running after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BarError::Registry(_))
    }
}

/// Errors about the state of the daemon process that are reported to the user as plain messages.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DaemonStateError {
    #[error("Another cyanbar process is already running!")]
    AlreadyRunning,

    #[error("The cyanbar was not running.")]
    NotRunning,
}
