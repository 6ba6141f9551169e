use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use clap_complete::Shell;
use cyanbar_shared_util::SlotName;

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq)]
pub struct Opt {
    pub log_debug: bool,
    pub config_path: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub detach: bool,
    pub action: Action,
}

#[derive(Debug, PartialEq)]
pub enum Action {
    /// Start the bar.
    Run,
    /// Kill the running bar.
    Kill,
    /// Refresh the given elements of the running bar right away.
    Update(Vec<SlotName>),
    /// Print a shell completion script.
    ShellCompletions { shell: Shell },
}

/// Run and control the bar.
#[derive(Parser, Debug)]
#[command(name = "cyanbar", version, about, long_about = None)]
#[command(group(ArgGroup::new("action").required(true).args(["run", "kill", "update", "shell_completions"])))]
pub(super) struct RawOpt {
    /// Start the bar.
    #[arg(short, long)]
    run: bool,

    /// Kill the bar process.
    #[arg(short, long)]
    kill: bool,

    /// Update a bar element (don't wait for the heartbeat).
    #[arg(short, long, value_name = "ELEMENT", num_args = 1..)]
    update: Vec<String>,

    /// Print a shell completion script for the given shell.
    #[arg(long, value_name = "SHELL", value_enum)]
    shell_completions: Option<Shell>,

    /// Write out debug logs.
    #[arg(long = "debug")]
    log_debug: bool,

    /// Override the path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the pid, lock and control files. Defaults to the home directory.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Fork into the background, writing logs to the log file.
    #[arg(long)]
    detach: bool,
}

impl Opt {
    pub fn from_env() -> Self {
        RawOpt::parse().into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt { run: _, kill, update, shell_completions, log_debug, config, state_dir, detach } = other;
        let action = match shell_completions {
            Some(shell) => Action::ShellCompletions { shell },
            None if kill => Action::Kill,
            None if !update.is_empty() => Action::Update(update.into_iter().map(SlotName::from).collect()),
            None => Action::Run,
        };
        Opt { log_debug, config_path: config, state_dir, detach, action }
    }
}
